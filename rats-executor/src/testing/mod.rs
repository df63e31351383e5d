//! Helpers for testing pipelines.
//!
//! [`ExecutionLog`] hands out executables that record their node key when
//! they run, so tests can assert on execution order and on what every other
//! node's state was at that moment.
//!
//! ```ignore
//! let log = ExecutionLog::new();
//! let session = PipelineBuilder::new()
//!     .add_node(Node::new("a"))?
//!     .set_executable(&Node::new("a"), log.executable("a"))?
//!     .build()?;
//! ```

mod recorder;

pub use recorder::{ExecutionLog, ExecutionRecord};
