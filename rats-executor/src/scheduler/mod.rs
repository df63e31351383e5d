//! Scheduling: graph validation and the frame controller.
//!
//! - [`DependencyGraph`] - static checks over the registered nodes (unknown
//!   dependencies, cycles) and a topological plan
//! - [`Frame`] - one discrete scheduling step ("tick")

mod frame;
mod graph;

pub use frame::{ExecutionOutcome, Frame, FrameReport};
pub use graph::DependencyGraph;
