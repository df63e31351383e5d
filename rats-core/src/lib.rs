//! rats core library
//!
//! Foundational types and contracts for the rats pipeline engine.
//!
//! # Key Components
//!
//! - **Types**: `Node`, `NodeState`, `SessionState`, `SessionId`
//! - **Traits**: `Executable`, the unit of work bound to a node
//! - **IO**: `DataStore`, the key/value contract executables exchange data through
//! - **Logging**: structured, queryable session events
//! - **Settings** and **Flow**: session configuration and YAML pipeline definitions
//!
//! The scheduler itself lives in `rats-executor`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod flow;
pub mod io;
pub mod logging;
pub mod prelude;
pub mod settings;
pub mod traits;
pub mod types;

pub use error::{BoxError, RatsError, Result};
pub use settings::{ConcurrentSettings, FailurePolicy, SessionSettings};
pub use traits::{Executable, ExecuteResult};
pub use types::{Node, NodeState, PipelineNode, SessionId, SessionState};
