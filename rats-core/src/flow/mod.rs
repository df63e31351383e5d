//! Pipeline definitions.
//!
//! A pipeline can be declared in YAML and turned into a session by the
//! loader in `rats-executor`. This module owns the document model and its
//! structural validation; executable kinds are resolved by the loader.

mod definition;

pub use definition::{ExecutableSpec, NodeDefinition, PipelineDefinition, ValidationIssue};
