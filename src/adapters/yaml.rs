//! YAML serializer, the format the workflow engine's CLI submits.

use anyhow::{Context, Result};

use super::DocumentSerializer;
use crate::domain::Document;

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlSerializer;

impl DocumentSerializer for YamlSerializer {
    fn format(&self) -> &str {
        "yaml"
    }

    fn serialize(&self, document: &Document) -> Result<String> {
        serde_yaml::to_string(document).context("Failed to serialize workflow as YAML")
    }
}
