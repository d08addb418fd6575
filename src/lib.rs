//! argoml - Compiler for ML build-and-serve workflows
//!
//! Turns a handful of configuration values into a complete Argo `Workflow`
//! document that trains a model, builds and pushes its serving images, and
//! deploys them.
//!
//! # Architecture
//!
//! Compilation is a pure function of the configuration:
//! - The model type selects the build branch and extra build arguments
//! - The runner selects the training images and commands
//! - Feature flags add optional stats and processor images
//! - One random suffix keeps generated resource names unique
//!
//! # Modules
//!
//! - `adapters`: Document serializers (YAML, JSON)
//! - `config`: Configuration file, discovery and overrides
//! - `core`: Compilation logic (Compiler, branch and runner selection)
//! - `domain`: Workflow document model
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Compile a training-and-serving workflow and submit it
//! argoml compile build-serve --config workflow.yaml | argo submit -
//!
//! # Serve two trained models
//! argoml compile serve --model-path models/a,models/b -o serve.yaml
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{DocumentSerializer, JsonSerializer, YamlSerializer};
pub use config::{ConfigError, WorkflowConfig};
pub use crate::core::{CompileError, Compiler, Variant};
pub use domain::{Document, StructureError};
