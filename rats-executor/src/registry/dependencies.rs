//! Dependency registry.

use parking_lot::Mutex;
use rats_core::error::{RatsError, Result};
use rats_core::types::{Node, PipelineNode};
use std::collections::{HashMap, HashSet};

/// Prerequisites per node.
///
/// Registration is single-shot: each node's dependency set is registered at
/// most once. A node with no registered dependencies is independent.
#[derive(Debug)]
pub struct DependencyRegistry<N: PipelineNode = Node> {
    inner: Mutex<HashMap<N, HashSet<N>>>,
}

impl<N: PipelineNode> DependencyRegistry<N> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Register the full dependency set of `node`.
    ///
    /// Fails if dependencies for `node` were already registered, even with
    /// identical content.
    pub fn register_dependencies(
        &self,
        node: &N,
        dependencies: impl IntoIterator<Item = N>,
    ) -> Result<()> {
        let mut table = self.inner.lock();
        if table.contains_key(node) {
            return Err(RatsError::DuplicateDependencyRegistration {
                key: node.key().to_string(),
            });
        }
        table.insert(node.clone(), dependencies.into_iter().collect());
        Ok(())
    }

    /// The prerequisites of `node` (empty if none were registered).
    pub fn get_dependencies(&self, node: &N) -> HashSet<N> {
        self.inner.lock().get(node).cloned().unwrap_or_default()
    }

    /// Whether dependencies were registered for `node`.
    pub fn has_registration(&self, node: &N) -> bool {
        self.inner.lock().contains_key(node)
    }

    /// Nodes among `nodes` whose every prerequisite is in `completed`.
    ///
    /// Nodes that are themselves in `completed` are never reported. This is a
    /// pure function of the registry contents and does not look at node state.
    pub fn get_nodes_with_satisfied_dependencies(
        &self,
        nodes: &[N],
        completed: &HashSet<N>,
    ) -> HashSet<N> {
        let table = self.inner.lock();
        nodes
            .iter()
            .filter(|node| !completed.contains(*node))
            .filter(|node| {
                table
                    .get(*node)
                    .is_none_or(|deps| deps.is_subset(completed))
            })
            .cloned()
            .collect()
    }

    /// Nodes that list `node` as a prerequisite.
    pub fn dependents_of(&self, node: &N) -> Vec<N> {
        self.inner
            .lock()
            .iter()
            .filter(|(_, deps)| deps.contains(node))
            .map(|(dependent, _)| dependent.clone())
            .collect()
    }
}

impl<N: PipelineNode> Default for DependencyRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}
