//! Serializers for compiled workflow documents.
//!
//! Serializers provide a unified interface for turning a finished
//! [`Document`] into the text submitted to the workflow engine.

pub mod json;
pub mod yaml;

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::domain::Document;

pub use json::JsonSerializer;
pub use yaml::YamlSerializer;

/// Trait for document serializers
pub trait DocumentSerializer: Send + Sync {
    /// Format name (e.g. "yaml")
    fn format(&self) -> &str;

    /// Serialize a complete document
    fn serialize(&self, document: &Document) -> Result<String>;
}

/// Serializer for a format name, if supported
pub fn serializer_for(format: &str) -> Option<Box<dyn DocumentSerializer>> {
    match format.to_ascii_lowercase().as_str() {
        "yaml" | "yml" => Some(Box::new(YamlSerializer)),
        "json" => Some(Box::new(JsonSerializer)),
        _ => None,
    }
}

/// Hex SHA-256 of serialized output
pub fn fingerprint(serialized: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    hex::encode(hasher.finalize())
}
