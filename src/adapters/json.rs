//! JSON serializer, for submitting through the engine's API server.

use anyhow::{Context, Result};

use super::DocumentSerializer;
use crate::domain::Document;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl DocumentSerializer for JsonSerializer {
    fn format(&self) -> &str {
        "json"
    }

    fn serialize(&self, document: &Document) -> Result<String> {
        let mut out =
            serde_json::to_string_pretty(document).context("Failed to serialize workflow as JSON")?;
        out.push('\n');
        Ok(out)
    }
}
