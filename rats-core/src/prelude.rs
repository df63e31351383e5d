//! Convenient re-exports.

pub use crate::error::{BoxError, RatsError, Result};
pub use crate::flow::{ExecutableSpec, NodeDefinition, PipelineDefinition};
pub use crate::io::{DataStore, MemoryStore, PortKey};
pub use crate::logging::{
    BufferedCollector, EventKind, LogCategory, LogCollector, LogEvent, LogLevel,
};
pub use crate::settings::{ConcurrentSettings, FailurePolicy, SessionSettings};
pub use crate::traits::{Executable, ExecuteResult, FnExecutable, from_fn};
pub use crate::types::{Node, NodeState, PipelineNode, SessionId, SessionState};
