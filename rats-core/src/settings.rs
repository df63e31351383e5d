//! Session runtime settings.

use crate::error::{RatsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the frame controller does when an executable fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Mark the node failed and return the error from the run loop.
    #[default]
    Propagate,
    /// Mark the node failed, fail everything downstream of it, keep running.
    Continue,
}

impl FailurePolicy {
    /// Get the string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Propagate => "propagate",
            Self::Continue => "continue",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = RatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "propagate" => Ok(Self::Propagate),
            "continue" => Ok(Self::Continue),
            other => Err(RatsError::ConfigValue {
                field: "failure_policy".to_string(),
                cause: format!("unknown policy '{other}'"),
            }),
        }
    }
}

/// Settings for a single session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Consecutive ticks without any state change, while work remains,
    /// before the session reports a deadlock. Sessions treat 0 as 1.
    pub deadlock_threshold: u32,
    /// Failure handling.
    pub failure_policy: FailurePolicy,
    /// Optional upper bound on the number of ticks in one run.
    pub max_ticks: Option<u64>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            deadlock_threshold: 2,
            failure_policy: FailurePolicy::default(),
            max_ticks: None,
        }
    }
}

impl SessionSettings {
    /// Create configuration from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `RATS_DEADLOCK_THRESHOLD`: ticks without progress before a deadlock is raised
    /// - `RATS_FAILURE_POLICY`: `propagate` or `continue`
    /// - `RATS_MAX_TICKS`: hard bound on ticks per run
    ///
    /// Unset or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let deadlock_threshold = std::env::var("RATS_DEADLOCK_THRESHOLD")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.deadlock_threshold);

        let failure_policy = std::env::var("RATS_FAILURE_POLICY")
            .ok()
            .and_then(|s| s.parse::<FailurePolicy>().ok())
            .unwrap_or(defaults.failure_policy);

        let max_ticks = std::env::var("RATS_MAX_TICKS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok());

        Self {
            deadlock_threshold,
            failure_policy,
            max_ticks,
        }
        .normalized()
    }

    /// Set the deadlock threshold (at least 1).
    pub fn with_deadlock_threshold(mut self, ticks: u32) -> Self {
        self.deadlock_threshold = ticks;
        self.normalized()
    }

    /// Set the failure policy.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set a hard bound on ticks per run.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    fn normalized(mut self) -> Self {
        self.deadlock_threshold = self.deadlock_threshold.max(1);
        self
    }
}

/// Settings for the concurrent session variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrentSettings {
    /// Maximum number of node executables in flight at once. Sessions treat 0 as 1.
    pub max_concurrent_nodes: usize,
}

impl Default for ConcurrentSettings {
    fn default() -> Self {
        Self {
            max_concurrent_nodes: 4,
        }
    }
}

impl ConcurrentSettings {
    /// Create configuration from `RATS_MAX_CONCURRENT_NODES`, or use defaults.
    pub fn from_env() -> Self {
        let max_concurrent_nodes = std::env::var("RATS_MAX_CONCURRENT_NODES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(Self::default().max_concurrent_nodes);
        Self::default().with_max_concurrent_nodes(max_concurrent_nodes)
    }

    /// Set maximum concurrent nodes.
    pub fn with_max_concurrent_nodes(mut self, max: usize) -> Self {
        self.max_concurrent_nodes = max.max(1); // At least 1
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = SessionSettings::default();
        assert_eq!(settings.deadlock_threshold, 2);
        assert_eq!(settings.failure_policy, FailurePolicy::Propagate);
        assert_eq!(settings.max_ticks, None);
    }

    #[test]
    fn threshold_is_at_least_one() {
        let settings = SessionSettings::default().with_deadlock_threshold(0);
        assert_eq!(settings.deadlock_threshold, 1);

        let concurrent = ConcurrentSettings::default().with_max_concurrent_nodes(0);
        assert_eq!(concurrent.max_concurrent_nodes, 1);
    }

    #[test]
    fn failure_policy_parsing() {
        assert_eq!("continue".parse::<FailurePolicy>().unwrap(), FailurePolicy::Continue);
        assert_eq!("PROPAGATE".parse::<FailurePolicy>().unwrap(), FailurePolicy::Propagate);
        assert!("retry".parse::<FailurePolicy>().is_err());
    }

    #[test]
    fn settings_from_yaml() {
        let settings: SessionSettings =
            serde_yaml::from_str("failure_policy: continue\nmax_ticks: 50\n").unwrap();
        assert_eq!(settings.failure_policy, FailurePolicy::Continue);
        assert_eq!(settings.max_ticks, Some(50));
        assert_eq!(settings.deadlock_threshold, 2);
    }

    #[test]
    fn from_env_without_variables_uses_defaults() {
        let settings = SessionSettings::from_env();
        assert!(settings.deadlock_threshold >= 1);
    }
}
