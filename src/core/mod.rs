//! Compilation logic.
//!
//! This module contains:
//! - Naming: Unique suffixes for generated resource names
//! - Branch: Model-type dependent build branch and arguments
//! - Runner: Runner-dependent training images and commands
//! - Items: Optional fan-out items
//! - Compiler: The three workflow variants

pub mod branch;
pub mod catalog;
pub mod compiler;
pub mod items;
pub mod naming;
pub mod runner;

// Re-export commonly used types
pub use branch::{resolve as resolve_branch, BranchResolution};
pub use compiler::{CompileError, Compiler, Variant};
pub use items::OptionalStages;
pub use naming::{validate_suffix, FixedSuffixes, RandomSuffix, SuffixSource};
pub use runner::{Runner, Stage};
