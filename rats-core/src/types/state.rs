//! Node and session lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a node within a session.
///
/// ```text
/// Registered -> Queued -> Pending -> Running -> Completed
///                  \                      \-> Failed
///                   \-> Failed (upstream failure, `FailurePolicy::Continue`)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    /// Added to the session; may still be configured for one tick.
    Registered,
    /// Waiting for its dependencies.
    Queued,
    /// Dependencies satisfied; waiting to be executed.
    Pending,
    /// Executable in flight.
    Running,
    /// Executable finished successfully.
    Completed,
    /// Executable failed, or an upstream node failed.
    Failed,
}

impl NodeState {
    /// All states, in lifecycle order.
    pub const ALL: [NodeState; 6] = [
        Self::Registered,
        Self::Queued,
        Self::Pending,
        Self::Running,
        Self::Completed,
        Self::Failed,
    ];

    /// States that still count as outstanding work.
    pub const UNFINISHED: [NodeState; 4] =
        [Self::Registered, Self::Queued, Self::Pending, Self::Running];

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the node still counts as outstanding work.
    pub fn is_unfinished(self) -> bool {
        !self.is_terminal()
    }

    /// Whether `self -> next` is a forward edge of the state machine.
    pub fn can_transition_to(self, next: NodeState) -> bool {
        matches!(
            (self, next),
            (Self::Registered, Self::Queued)
                | (Self::Queued, Self::Pending)
                | (Self::Queued, Self::Failed)
                | (Self::Pending, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }

    /// Get the string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Queued => "queued",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, not yet running.
    #[default]
    Pending,
    /// The run loop is ticking.
    Running,
    /// All work finished, or `stop()` was called.
    Stopped,
}

impl SessionState {
    /// Get the string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
