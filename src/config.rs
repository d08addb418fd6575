//! Configuration for workflow compilation.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (ARGOML_MODEL_TYPE, ARGOML_RUNNER, ...)
//! 2. Config file (explicit path, or .argoml/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .argoml/config.yaml
//! - Falls back to <user config dir>/argoml/config.yaml

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::runner::Runner;
use crate::domain::workflow::validate_resource_name;

/// Repository holding the Dockerfiles for every served image
pub const DEFAULT_GIT_REPO: &str = "https://github.com/venci6/demos.git";

pub const DEFAULT_RUNNER: &str = "DirectRunner";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkflowConfig {
    /// Model family; also the generated workflow name prefix
    pub model_type: Option<String>,

    /// Where feature engineering writes its output
    pub features_path: Option<String>,

    /// Column specification passed to every stage
    pub columns: Option<String>,

    /// Trained model location; comma-separated for serve-only workflows
    pub model_path: Option<String>,

    /// Raw input data for feature engineering
    pub data_path: Option<String>,

    pub docker_repo: Option<String>,

    /// Image tag; a random suffix is appended per compilation
    pub docker_version: Option<String>,

    /// Object keys of the jars each stage runs or bakes into an image
    pub feature_jar: Option<String>,
    pub function_jar: Option<String>,
    pub function_name: Option<String>,
    pub training_jar: Option<String>,
    pub model_jar: Option<String>,
    pub stats_jar: Option<String>,
    pub processor_jar: Option<String>,

    /// Beam runner for both stages (DirectRunner, FlinkRunner, SparkRunner)
    #[serde(default = "default_runner")]
    pub runner: String,

    /// Per-stage runner overrides
    pub feature_runner: Option<String>,
    pub training_runner: Option<String>,

    pub s3_endpoint: Option<String>,
    pub s3_bucket: Option<String>,

    #[serde(default = "default_git_repo")]
    pub git_repo: String,

    /// Prefix of the Kubernetes resources created for serving
    pub kube_name: Option<String>,

    #[serde(default)]
    pub enable_stats: bool,

    #[serde(default)]
    pub enable_processor: bool,
}

fn default_runner() -> String {
    DEFAULT_RUNNER.to_string()
}

fn default_git_repo() -> String {
    DEFAULT_GIT_REPO.to_string()
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            model_type: None,
            features_path: None,
            columns: None,
            model_path: None,
            data_path: None,
            docker_repo: None,
            docker_version: None,
            feature_jar: None,
            function_jar: None,
            function_name: None,
            training_jar: None,
            model_jar: None,
            stats_jar: None,
            processor_jar: None,
            runner: default_runner(),
            feature_runner: None,
            training_runner: None,
            s3_endpoint: None,
            s3_bucket: None,
            git_repo: default_git_repo(),
            kube_name: None,
            enable_stats: false,
            enable_processor: false,
        }
    }
}

/// Optional configuration fields, by their config-file key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ModelType,
    FeaturesPath,
    Columns,
    ModelPath,
    DataPath,
    DockerRepo,
    DockerVersion,
    FeatureJar,
    FunctionJar,
    FunctionName,
    TrainingJar,
    ModelJar,
    StatsJar,
    ProcessorJar,
    S3Endpoint,
    S3Bucket,
    KubeName,
}

impl Field {
    pub fn key(self) -> &'static str {
        match self {
            Self::ModelType => "model_type",
            Self::FeaturesPath => "features_path",
            Self::Columns => "columns",
            Self::ModelPath => "model_path",
            Self::DataPath => "data_path",
            Self::DockerRepo => "docker_repo",
            Self::DockerVersion => "docker_version",
            Self::FeatureJar => "feature_jar",
            Self::FunctionJar => "function_jar",
            Self::FunctionName => "function_name",
            Self::TrainingJar => "training_jar",
            Self::ModelJar => "model_jar",
            Self::StatsJar => "stats_jar",
            Self::ProcessorJar => "processor_jar",
            Self::S3Endpoint => "s3_endpoint",
            Self::S3Bucket => "s3_bucket",
            Self::KubeName => "kube_name",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Missing or malformed configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingField { field: Field },

    #[error("Invalid configuration field {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

impl WorkflowConfig {
    /// Parse a config from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config YAML")
    }

    /// Value of an optional field, treating blank values as absent
    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::ModelType => &self.model_type,
            Field::FeaturesPath => &self.features_path,
            Field::Columns => &self.columns,
            Field::ModelPath => &self.model_path,
            Field::DataPath => &self.data_path,
            Field::DockerRepo => &self.docker_repo,
            Field::DockerVersion => &self.docker_version,
            Field::FeatureJar => &self.feature_jar,
            Field::FunctionJar => &self.function_jar,
            Field::FunctionName => &self.function_name,
            Field::TrainingJar => &self.training_jar,
            Field::ModelJar => &self.model_jar,
            Field::StatsJar => &self.stats_jar,
            Field::ProcessorJar => &self.processor_jar,
            Field::S3Endpoint => &self.s3_endpoint,
            Field::S3Bucket => &self.s3_bucket,
            Field::KubeName => &self.kube_name,
        };

        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Value of a field that must be present
    pub fn require(&self, field: Field) -> Result<&str, ConfigError> {
        self.get(field).ok_or(ConfigError::MissingField { field })
    }

    /// Workflow name prefix derived from the model type
    pub fn generate_name(&self) -> Result<String, ConfigError> {
        let name = self.require(Field::ModelType)?.to_ascii_lowercase();
        validate_resource_name(&name).map_err(|reason| ConfigError::InvalidField {
            field: Field::ModelType.to_string(),
            reason: reason.to_string(),
        })?;
        Ok(name)
    }

    /// Kubernetes name prefix for serving resources
    pub fn kube_name(&self) -> Result<&str, ConfigError> {
        let name = self.require(Field::KubeName)?;
        validate_resource_name(name).map_err(|reason| ConfigError::InvalidField {
            field: Field::KubeName.to_string(),
            reason: reason.to_string(),
        })?;
        Ok(name)
    }

    /// Model paths listed in `model_path`, in configuration order
    pub fn model_paths(&self) -> Result<Vec<&str>, ConfigError> {
        let paths: Vec<&str> = self
            .require(Field::ModelPath)?
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        if paths.is_empty() {
            return Err(ConfigError::InvalidField {
                field: Field::ModelPath.to_string(),
                reason: "no model paths listed".to_string(),
            });
        }
        Ok(paths)
    }

    /// Runner for the feature-engineering stage
    pub fn feature_runner(&self) -> Runner {
        Runner::from(self.feature_runner.as_deref().unwrap_or(&self.runner))
    }

    /// Runner for the training stage
    pub fn training_runner(&self) -> Runner {
        Runner::from(self.training_runner.as_deref().unwrap_or(&self.runner))
    }

    /// Apply `ARGOML_*` overrides using `lookup` to read variables
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("ARGOML_MODEL_TYPE") {
            self.model_type = Some(value);
        }
        if let Some(value) = lookup("ARGOML_MODEL_PATH") {
            self.model_path = Some(value);
        }
        if let Some(value) = lookup("ARGOML_DOCKER_VERSION") {
            self.docker_version = Some(value);
        }
        if let Some(value) = lookup("ARGOML_RUNNER") {
            self.runner = value;
        }
        if let Some(value) = lookup("ARGOML_ENABLE_STATS") {
            self.enable_stats = parse_flag("ARGOML_ENABLE_STATS", &value)?;
        }
        if let Some(value) = lookup("ARGOML_ENABLE_PROCESSOR") {
            self.enable_processor = parse_flag("ARGOML_ENABLE_PROCESSOR", &value)?;
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidField {
            field: name.to_string(),
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}

/// Resolved configuration plus where it came from
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub workflow: WorkflowConfig,

    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    if let Ok(mut current) = std::env::current_dir() {
        loop {
            let config_path = current.join(".argoml").join("config.yaml");
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("argoml").join("config.yaml"))
        .filter(|path| path.exists())
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<WorkflowConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    WorkflowConfig::from_yaml(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from all sources
pub fn load(explicit: Option<&Path>) -> Result<ResolvedConfig> {
    let config_file = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    let mut workflow = match config_file {
        Some(ref path) => load_config_file(path)?,
        None => WorkflowConfig::default(),
    };

    workflow.apply_env_overrides(|name| std::env::var(name).ok())?;

    tracing::debug!(
        config_file = ?config_file,
        model_type = ?workflow.model_type,
        "Configuration loaded"
    );

    Ok(ResolvedConfig {
        workflow,
        config_file,
    })
}
