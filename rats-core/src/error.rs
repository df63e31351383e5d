//! Error types for rats.
//!
//! Every error carries the identifiers needed to act on it (node key,
//! session id, service name). Errors raised by user executables are kept
//! intact as the `source` of [`RatsError::NodeExecution`] so callers can
//! downcast back to the original type.

use crate::types::SessionId;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed error produced by an executable.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for rats operations.
#[derive(Error, Debug)]
pub enum RatsError {
    // =========================================================================
    // Registration Errors (E100-E199)
    // =========================================================================
    /// A node with the same key was already registered.
    #[error("E101: Node '{key}' is already registered")]
    DuplicateNode {
        /// The duplicated node key.
        key: String,
    },

    /// No node is registered under the key.
    #[error("E102: Node '{key}' not found")]
    NodeNotFound {
        /// The key that was looked up.
        key: String,
    },

    /// Dependencies for the node were already registered.
    #[error("E103: Dependencies for node '{key}' are already registered")]
    DuplicateDependencyRegistration {
        /// The node whose dependencies were registered twice.
        key: String,
    },

    /// A dependency references a node that is not part of the pipeline.
    #[error("E104: Node '{key}' depends on unregistered node '{dependency}'")]
    UnknownDependency {
        /// The dependent node.
        key: String,
        /// The missing prerequisite.
        dependency: String,
    },

    /// An executable was already bound to the node.
    #[error("E105: Executable for node '{key}' is already registered")]
    DuplicateExecutable {
        /// The node key.
        key: String,
    },

    /// No executable is bound to the node.
    #[error("E106: No executable registered for node '{key}'")]
    ExecutableNotFound {
        /// The node key.
        key: String,
    },

    /// The node has never been given a state.
    #[error("E107: No state recorded for node '{key}'")]
    NodeStateNotFound {
        /// The node key.
        key: String,
    },

    /// A service with the same identifier was already registered.
    #[error("E108: Service '{name}' is already registered")]
    DuplicateService {
        /// The service identifier.
        name: String,
    },

    /// No service is registered under the identifier.
    #[error("E109: Service '{name}' not found")]
    ServiceNotFound {
        /// The service identifier.
        name: String,
    },

    // =========================================================================
    // Scheduling Errors (E200-E299)
    // =========================================================================
    /// The session stopped making progress while work remained.
    #[error("E201: Session {session_id} deadlocked after {ticks} ticks; unfinished nodes: {nodes:?}")]
    Deadlock {
        /// The session that deadlocked.
        session_id: SessionId,
        /// Number of ticks executed before the deadlock was detected.
        ticks: u64,
        /// Nodes that never reached a terminal state.
        nodes: Vec<String>,
    },

    /// The dependency graph contains a cycle.
    #[error("E202: Dependency cycle detected between nodes: {nodes:?}")]
    UncontrolledCycle {
        /// Nodes that participate in (or are blocked by) the cycle.
        nodes: Vec<String>,
    },

    // =========================================================================
    // Execution Errors (E300-E399)
    // =========================================================================
    /// A node's executable returned an error.
    #[error("E301: Node '{key}' execution failed: {source}")]
    NodeExecution {
        /// The node that failed.
        key: String,
        /// The error returned by the executable.
        #[source]
        source: BoxError,
    },

    /// A node's executable panicked.
    #[error("E302: Node '{key}' panicked: {message}")]
    NodePanic {
        /// The node that panicked.
        key: String,
        /// The panic payload, when it was a string.
        message: String,
    },

    /// No data stored under the requested key.
    #[error("E303: No data stored for {key}")]
    DataNotFound {
        /// The store key (`node.port`).
        key: String,
    },

    // =========================================================================
    // Definition / Config Errors (E400-E499)
    // =========================================================================
    /// The pipeline definition is invalid.
    #[error("E401: Invalid pipeline definition: {cause}")]
    InvalidDefinition {
        /// Description of the problem.
        cause: String,
    },

    /// A configuration value is invalid.
    #[error("E402: Invalid config value for '{field}': {cause}")]
    ConfigValue {
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        cause: String,
    },

    /// YAML could not be parsed.
    #[error("E403: YAML parse error in {path}: {cause}")]
    YamlParse {
        /// The file being parsed (`<inline>` for strings).
        path: PathBuf,
        /// The parser message.
        cause: String,
    },

    // =========================================================================
    // IO Errors (E900-E999)
    // =========================================================================
    /// File system error.
    #[error("E901: I/O error at {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl RatsError {
    /// Wrap an executable failure for the given node.
    pub fn execution(key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::NodeExecution {
            key: key.into(),
            source: source.into(),
        }
    }

    /// Get the error code (e.g., "E101").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateNode { .. } => "E101",
            Self::NodeNotFound { .. } => "E102",
            Self::DuplicateDependencyRegistration { .. } => "E103",
            Self::UnknownDependency { .. } => "E104",
            Self::DuplicateExecutable { .. } => "E105",
            Self::ExecutableNotFound { .. } => "E106",
            Self::NodeStateNotFound { .. } => "E107",
            Self::DuplicateService { .. } => "E108",
            Self::ServiceNotFound { .. } => "E109",
            Self::Deadlock { .. } => "E201",
            Self::UncontrolledCycle { .. } => "E202",
            Self::NodeExecution { .. } => "E301",
            Self::NodePanic { .. } => "E302",
            Self::DataNotFound { .. } => "E303",
            Self::InvalidDefinition { .. } => "E401",
            Self::ConfigValue { .. } => "E402",
            Self::YamlParse { .. } => "E403",
            Self::Io { .. } => "E901",
        }
    }

    /// Check if this error was raised while wiring a pipeline together.
    #[must_use]
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateNode { .. }
                | Self::NodeNotFound { .. }
                | Self::DuplicateDependencyRegistration { .. }
                | Self::UnknownDependency { .. }
                | Self::DuplicateExecutable { .. }
                | Self::ExecutableNotFound { .. }
                | Self::NodeStateNotFound { .. }
                | Self::DuplicateService { .. }
                | Self::ServiceNotFound { .. }
        )
    }

    /// Check if this error is a configuration/validation error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::UncontrolledCycle { .. }
                | Self::UnknownDependency { .. }
                | Self::InvalidDefinition { .. }
                | Self::ConfigValue { .. }
                | Self::YamlParse { .. }
        )
    }

    /// Check if this error came out of a node's executable.
    #[must_use]
    pub fn is_execution_error(&self) -> bool {
        matches!(self, Self::NodeExecution { .. } | Self::NodePanic { .. })
    }
}

/// Result type alias using `RatsError`.
pub type Result<T> = std::result::Result<T, RatsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, thiserror::Error)]
    #[error("disk full")]
    struct DiskFull;

    #[test]
    fn error_codes_are_correct() {
        let err = RatsError::DuplicateNode {
            key: "a".to_string(),
        };
        assert_eq!(err.code(), "E101");

        let err = RatsError::Deadlock {
            session_id: SessionId::new(),
            ticks: 3,
            nodes: vec!["b".to_string()],
        };
        assert_eq!(err.code(), "E201");
    }

    #[test]
    fn error_display() {
        let err = RatsError::UnknownDependency {
            key: "train".to_string(),
            dependency: "ingest".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("E104"));
        assert!(msg.contains("train"));
        assert!(msg.contains("ingest"));
    }

    #[test]
    fn execution_error_keeps_original_source() {
        let err = RatsError::execution("load", DiskFull);
        assert!(err.is_execution_error());

        let source = err.source().expect("source is preserved");
        assert!(source.downcast_ref::<DiskFull>().is_some());
    }

    #[test]
    fn classification() {
        assert!(
            RatsError::DuplicateDependencyRegistration {
                key: "a".to_string()
            }
            .is_registration_error()
        );
        assert!(
            RatsError::UncontrolledCycle {
                nodes: vec!["a".to_string()]
            }
            .is_config_error()
        );
        assert!(
            !RatsError::NodePanic {
                key: "a".to_string(),
                message: "boom".to_string()
            }
            .is_config_error()
        );
    }
}
