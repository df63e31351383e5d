//! rats executor - the node-state-machine scheduler.
//!
//! This crate provides the runtime for rats pipelines:
//! - Node, dependency, state, executable and session-state registries
//! - Dependency graph validation (unknown dependencies, cycles)
//! - The frame controller, which advances a session one tick at a time
//! - Synchronous and concurrent (tokio) sessions with deadlock detection
//! - A typed service container and the YAML pipeline loader
//! - Tracing subscriber setup

#![warn(missing_docs)]

pub mod container;
pub mod loader;
pub mod observability;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod testing;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::container::{ServiceContainer, ServiceId};
    pub use crate::loader::{ExecutableCatalog, LoaderConfig, PipelineLoader};
    pub use crate::observability::{LogFormat, TracingConfig, init_tracing};
    pub use crate::registry::{
        DependencyRegistry, ExecutableRegistry, NodeRegistry, NodeStateRegistry, Registries,
        SessionStateRegistry,
    };
    pub use crate::scheduler::{DependencyGraph, ExecutionOutcome, Frame, FrameReport};
    pub use crate::session::{
        ConcurrentSession, PipelineBuilder, Session, SessionHandle, SessionReport,
    };
    pub use crate::testing::ExecutionLog;
}
