//! Core types for rats.
//!
//! - `Node`: the unit of schedulable work, identified by a unique key
//! - `PipelineNode`: the trait the scheduler is generic over
//! - `NodeState` / `SessionState`: the two lifecycle state machines
//! - `SessionId`: correlation identifier for one run

mod ids;
mod node;
mod state;

pub use ids::SessionId;
pub use node::{Node, PipelineNode};
pub use state::{NodeState, SessionState};
