//! Session events.

use crate::types::{NodeState, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of an event, derived from its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Node state transitions.
    Debug,
    /// Session start and completion.
    Info,
    /// Recoverable trouble.
    Warn,
    /// Node failures, aborted runs, deadlocks.
    Error,
}

/// Whether an event concerns the session as a whole or a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    /// Run loop lifecycle.
    Session,
    /// One node.
    Node,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// `run()` started ticking.
    SessionStarted,
    /// The completion check found no unfinished node.
    SessionCompleted,
    /// The run loop returned an error.
    SessionAborted {
        /// Error code, e.g. `E301`.
        code: String,
        /// Rendered error.
        error: String,
    },
    /// The session made no progress for too long.
    Deadlocked {
        /// Ticks performed by the run.
        ticks: u64,
        /// Keys of the nodes left unfinished.
        unfinished: Vec<String>,
    },
    /// A node changed state. `from` is `None` when the node is admitted.
    Transition {
        /// Previous state.
        from: Option<NodeState>,
        /// New state.
        to: NodeState,
    },
    /// A node's executable failed or could not be found.
    NodeFailed {
        /// Error code, e.g. `E301`.
        code: String,
        /// Rendered error.
        error: String,
    },
}

impl EventKind {
    /// Severity of this kind of event.
    pub fn level(&self) -> LogLevel {
        match self {
            Self::Transition { .. } => LogLevel::Debug,
            Self::SessionStarted | Self::SessionCompleted => LogLevel::Info,
            Self::SessionAborted { .. } | Self::Deadlocked { .. } | Self::NodeFailed { .. } => {
                LogLevel::Error
            }
        }
    }

    /// Category of this kind of event.
    pub fn category(&self) -> LogCategory {
        match self {
            Self::Transition { .. } | Self::NodeFailed { .. } => LogCategory::Node,
            _ => LogCategory::Session,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionStarted => f.write_str("session started"),
            Self::SessionCompleted => f.write_str("session completed"),
            Self::SessionAborted { error, .. } => write!(f, "session aborted: {error}"),
            Self::Deadlocked { ticks, unfinished } => write!(
                f,
                "deadlocked after {ticks} ticks, unfinished: [{}]",
                unfinished.join(", ")
            ),
            Self::Transition { from: None, to } => write!(f, "admitted as {to}"),
            Self::Transition { from: Some(from), to } => write!(f, "{from} -> {to}"),
            Self::NodeFailed { error, .. } => write!(f, "failed: {error}"),
        }
    }
}

/// One event recorded for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Sequence number, assigned by the collector.
    pub id: u64,
    /// When the event was created.
    pub at: DateTime<Utc>,
    /// The session the event belongs to.
    pub session_id: SessionId,
    /// Pipeline name, when the session has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<String>,
    /// Node key, for node events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    /// What happened.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl LogEvent {
    /// A session-level event.
    pub fn session(session_id: SessionId, kind: EventKind) -> Self {
        Self {
            id: 0,
            at: Utc::now(),
            session_id,
            pipeline: None,
            node: None,
            kind,
        }
    }

    /// An event about `node`.
    pub fn node(session_id: SessionId, node: impl Into<String>, kind: EventKind) -> Self {
        Self {
            node: Some(node.into()),
            ..Self::session(session_id, kind)
        }
    }

    /// Tag the event with a pipeline name.
    pub fn with_pipeline(mut self, pipeline: impl Into<String>) -> Self {
        self.pipeline = Some(pipeline.into());
        self
    }

    /// Severity, derived from the kind.
    pub fn level(&self) -> LogLevel {
        self.kind.level()
    }

    /// Category, derived from the kind.
    pub fn category(&self) -> LogCategory {
        self.kind.category()
    }

    /// The state a transition event moved to.
    pub fn reached(&self) -> Option<NodeState> {
        match self.kind {
            EventKind::Transition { to, .. } => Some(to),
            _ => None,
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.at.format("%H:%M:%S%.3f"), self.session_id)?;
        if let Some(pipeline) = &self.pipeline {
            write!(f, " [{pipeline}]")?;
        }
        if let Some(node) = &self.node {
            write!(f, " {node}:")?;
        }
        write!(f, " {}", self.kind)
    }
}
