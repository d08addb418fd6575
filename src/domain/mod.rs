//! Typed model of the workflow document.
//!
//! This module contains the data structures the compiler assembles:
//! - Workflow: Document root, Spec, Arguments
//! - Template: Step and leaf templates, containers, sidecars
//! - Artifact: Object-storage and git inputs
//! - Items: Fan-out item records
//!
//! Values are checked when constructed and are immutable afterwards.

pub mod artifact;
pub mod items;
pub mod placeholder;
pub mod template;
pub mod workflow;

// Re-export commonly used types
pub use artifact::{Artifact, ArtifactSource, GitLocation, S3Location, SecretRef};
pub use items::{BuildItem, FanOutItem, ServingItem};
pub use template::{
    Container, EnvVar, Inputs, ResourceAction, ResourceRequest, Sidecar, Step, Template,
    TemplateKind,
};
pub use workflow::{Arguments, Document, Parameter, Spec, StructureError};
