//! Node state registry.

use parking_lot::Mutex;
use rats_core::error::{RatsError, Result};
use rats_core::types::{Node, NodeState, PipelineNode};
use std::collections::HashMap;

/// Current lifecycle state per node.
///
/// `set_node_state` overwrites unconditionally; the frame controller is the
/// only writer and owns transition legality. Every write is also appended to
/// the node's history so a run can be audited afterwards.
#[derive(Debug)]
pub struct NodeStateRegistry<N: PipelineNode = Node> {
    inner: Mutex<StateTable<N>>,
}

#[derive(Debug)]
struct StateTable<N> {
    /// Nodes in the order they were first given a state.
    order: Vec<N>,
    states: HashMap<N, NodeState>,
    history: HashMap<N, Vec<NodeState>>,
}

impl<N: PipelineNode> NodeStateRegistry<N> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StateTable {
                order: Vec::new(),
                states: HashMap::new(),
                history: HashMap::new(),
            }),
        }
    }

    /// Set the state of `node`, returning the previous state.
    pub fn set_node_state(&self, node: &N, state: NodeState) -> Option<NodeState> {
        let mut table = self.inner.lock();
        let previous = table.states.insert(node.clone(), state);
        if previous.is_none() {
            table.order.push(node.clone());
        }
        table.history.entry(node.clone()).or_default().push(state);
        previous
    }

    /// The current state of `node`.
    pub fn get_node_state(&self, node: &N) -> Result<NodeState> {
        self.inner
            .lock()
            .states
            .get(node)
            .copied()
            .ok_or_else(|| RatsError::NodeStateNotFound {
                key: node.key().to_string(),
            })
    }

    /// Whether `node` has ever been given a state.
    pub fn has_state(&self, node: &N) -> bool {
        self.inner.lock().states.contains_key(node)
    }

    /// Nodes currently in `state`, in first-seen order.
    pub fn get_nodes_by_state(&self, state: NodeState) -> Vec<N> {
        self.get_nodes_in(&[state])
    }

    /// Nodes currently in any of `states`, in first-seen order.
    pub fn get_nodes_in(&self, states: &[NodeState]) -> Vec<N> {
        let table = self.inner.lock();
        table
            .order
            .iter()
            .filter(|node| {
                table
                    .states
                    .get(*node)
                    .is_some_and(|state| states.contains(state))
            })
            .cloned()
            .collect()
    }

    /// Every node with its current state, in first-seen order.
    pub fn snapshot(&self) -> Vec<(N, NodeState)> {
        let table = self.inner.lock();
        table
            .order
            .iter()
            .map(|node| (node.clone(), table.states[node]))
            .collect()
    }

    /// Every state `node` has been set to, oldest first.
    pub fn history(&self, node: &N) -> Vec<NodeState> {
        self.inner
            .lock()
            .history
            .get(node)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of nodes with a state.
    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    /// Whether no node has a state.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<N: PipelineNode> Default for NodeStateRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}
