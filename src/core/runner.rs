//! Runner selection for the feature-engineering and training containers.
//!
//! Independent of the model type: the runner decides only which image and
//! command line the two training-side stages use.

use std::fmt;

use crate::domain::template::Container;

use super::catalog::{
    FE_DIRECT_CMD, FE_FLINK_CMD, IMAGE_FLINK, IMAGE_JAVA, MT_DIRECT_CMD, MT_FLINK_CMD,
    MT_SPARK_CMD,
};

/// Beam runner a stage executes on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runner {
    Direct,
    Flink,
    Spark,
}

impl From<&str> for Runner {
    /// Case-insensitive; anything unrecognized runs directly
    fn from(value: &str) -> Self {
        if value.eq_ignore_ascii_case("FlinkRunner") {
            Self::Flink
        } else if value.eq_ignore_ascii_case("SparkRunner") {
            Self::Spark
        } else {
            Self::Direct
        }
    }
}

impl fmt::Display for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => write!(f, "DirectRunner"),
            Self::Flink => write!(f, "FlinkRunner"),
            Self::Spark => write!(f, "SparkRunner"),
        }
    }
}

/// Stages whose container depends on the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FeatureEngineering,
    Training,
}

/// Image and command line for a stage on a runner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerSelection {
    pub image: &'static str,
    pub command: &'static str,
}

/// Pick the image and command for `stage` on `runner`.
///
/// Feature engineering has no Spark command and runs directly instead.
pub fn select(stage: Stage, runner: Runner) -> RunnerSelection {
    let (image, command) = match (stage, runner) {
        (Stage::FeatureEngineering, Runner::Flink) => (IMAGE_FLINK, FE_FLINK_CMD),
        (Stage::FeatureEngineering, Runner::Spark | Runner::Direct) => (IMAGE_JAVA, FE_DIRECT_CMD),
        (Stage::Training, Runner::Flink) => (IMAGE_FLINK, MT_FLINK_CMD),
        (Stage::Training, Runner::Spark) => (IMAGE_JAVA, MT_SPARK_CMD),
        (Stage::Training, Runner::Direct) => (IMAGE_JAVA, MT_DIRECT_CMD),
    };
    RunnerSelection { image, command }
}

/// Container running `stage` on `runner` via `bash -c`
pub fn container(stage: Stage, runner: Runner) -> Container {
    let selection = select(stage, runner);
    Container::new(selection.image, ["bash", "-c"], [selection.command])
}
