//! Fan-out items for the optional stats and processor images.
//!
//! The builder only emits the optional tail of each item list; every
//! workflow variant prepends its own model item(s).

use crate::config::{ConfigError, Field, WorkflowConfig};
use crate::domain::items::{BuildItem, ServingItem};

use super::branch::BranchResolution;
use super::catalog::{
    BASIC_BRANCH, MODEL_IMAGE, PROCESSOR_BUILD_ARGS, PROCESSOR_IMAGE, STATS_BUILD_ARGS,
    STATS_IMAGE,
};

/// Optional images; `Some` holds the jar baked into an enabled image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionalStages {
    pub stats_jar: Option<String>,
    pub processor_jar: Option<String>,
}

impl OptionalStages {
    /// Read the feature flags and the jars they need
    pub fn from_config(conf: &WorkflowConfig) -> Result<Self, ConfigError> {
        let stats_jar = if conf.enable_stats {
            Some(conf.require(Field::StatsJar)?.to_string())
        } else {
            None
        };

        let processor_jar = if conf.enable_processor {
            Some(conf.require(Field::ProcessorJar)?.to_string())
        } else {
            None
        };

        Ok(Self {
            stats_jar,
            processor_jar,
        })
    }

    /// Build-and-push items, stats before processor
    pub fn build_items(&self) -> Vec<BuildItem> {
        let mut items = Vec::new();

        if let Some(jar) = &self.stats_jar {
            items.push(BuildItem {
                git_branch: BASIC_BRANCH.to_string(),
                jar: jar.clone(),
                cmd: STATS_BUILD_ARGS.to_string(),
            });
        }

        if let Some(jar) = &self.processor_jar {
            items.push(BuildItem {
                git_branch: BASIC_BRANCH.to_string(),
                jar: jar.clone(),
                cmd: PROCESSOR_BUILD_ARGS.to_string(),
            });
        }

        items
    }

    /// Serving items, stats before processor
    pub fn serving_items(&self) -> Vec<ServingItem> {
        let mut items = Vec::new();

        if self.stats_jar.is_some() {
            items.push(ServingItem::new(STATS_IMAGE));
        }

        if self.processor_jar.is_some() {
            items.push(ServingItem::new(PROCESSOR_IMAGE));
        }

        items
    }
}

/// Build item for a model image
pub fn model_build_item(resolution: &BranchResolution, jar: &str, base_cmd: &str) -> BuildItem {
    BuildItem {
        git_branch: resolution.branch.to_string(),
        jar: jar.to_string(),
        cmd: resolution.build_command(base_cmd),
    }
}

/// Serving item for the model image
pub fn model_serving_item() -> ServingItem {
    ServingItem::new(MODEL_IMAGE)
}
