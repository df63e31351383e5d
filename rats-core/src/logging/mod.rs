//! Structured session events.
//!
//! `tracing` carries the human-facing log stream. This module keeps a
//! queryable, in-process record of what a session did: every node
//! transition with its typed `from`/`to` states, node failures, and the run
//! loop's start, completion, abort and deadlock.
//!
//! ```text
//! Frame / Session ──LogEvent──> LogCollector ──> subscribers
//!                                    │
//!                                    └─> by_session / by_node / transitions
//! ```

mod collector;
mod event;

pub use collector::{
    BufferedCollector, DEFAULT_BUFFER_CAPACITY, LogCollector, NullCollector, SubscriberId,
};
pub use event::{EventKind, LogCategory, LogEvent, LogLevel};
