//! Recording executables.

use crate::registry::NodeStateRegistry;
use parking_lot::Mutex;
use rats_core::traits::{Executable, ExecuteResult, FnExecutable};
use rats_core::types::{Node, NodeState};
use std::sync::{Arc, OnceLock};

/// One recorded execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRecord {
    /// Key of the node that ran.
    pub key: String,
    /// Every node's state while it ran, if a state registry was attached.
    pub states: Vec<(Node, NodeState)>,
}

/// Shared, ordered log of executions.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    records: Arc<Mutex<Vec<ExecutionRecord>>>,
    observed: Arc<OnceLock<Arc<NodeStateRegistry>>>,
}

impl ExecutionLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture a snapshot of `states` with every record from now on.
    ///
    /// Only the first registry attached is used.
    pub fn observe(&self, states: Arc<NodeStateRegistry>) {
        let _ = self.observed.set(states);
    }

    /// An executable that records `key` and succeeds.
    pub fn executable(&self, key: impl Into<String>) -> Arc<dyn Executable> {
        self.recording(key.into(), || Ok(()))
    }

    /// An executable that records `key` and then runs `f`.
    pub fn recording<F>(&self, key: impl Into<String>, f: F) -> Arc<dyn Executable>
    where
        F: Fn() -> ExecuteResult + Send + Sync + 'static,
    {
        let key = key.into();
        let log = self.clone();
        Arc::new(FnExecutable::new(key.clone(), move || {
            log.push(&key);
            f()
        }))
    }

    /// Keys in execution order.
    pub fn keys(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.key.clone()).collect()
    }

    /// All records in execution order.
    pub fn records(&self) -> Vec<ExecutionRecord> {
        self.records.lock().clone()
    }

    /// Position of `key` in the execution order.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.records.lock().iter().position(|r| r.key == key)
    }

    fn push(&self, key: &str) {
        let states = self
            .observed
            .get()
            .map(|registry| registry.snapshot())
            .unwrap_or_default();
        self.records.lock().push(ExecutionRecord {
            key: key.to_string(),
            states,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_in_order_with_states() {
        let log = ExecutionLog::new();
        let states = Arc::new(NodeStateRegistry::new());
        states.set_node_state(&Node::new("a"), NodeState::Running);
        log.observe(Arc::clone(&states));

        log.executable("a").execute().unwrap();
        log.recording("b", || Err("late".into())).execute().unwrap_err();

        assert_eq!(log.keys(), vec!["a", "b"]);
        assert_eq!(log.position("b"), Some(1));
        assert_eq!(
            log.records()[0].states,
            vec![(Node::new("a"), NodeState::Running)]
        );
    }
}
