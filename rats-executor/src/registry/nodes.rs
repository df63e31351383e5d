//! Node registry.

use parking_lot::Mutex;
use rats_core::error::{RatsError, Result};
use rats_core::types::{Node, PipelineNode};
use std::collections::HashMap;

/// The complete set of nodes of a pipeline, in registration order.
#[derive(Debug)]
pub struct NodeRegistry<N: PipelineNode = Node> {
    inner: Mutex<NodeTable<N>>,
}

#[derive(Debug)]
struct NodeTable<N> {
    order: Vec<N>,
    by_key: HashMap<String, usize>,
}

impl<N: PipelineNode> NodeRegistry<N> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(NodeTable {
                order: Vec::new(),
                by_key: HashMap::new(),
            }),
        }
    }

    /// Register a node. Fails if a node with the same key exists.
    pub fn register(&self, node: N) -> Result<()> {
        let mut table = self.inner.lock();
        if table.by_key.contains_key(node.key()) {
            return Err(RatsError::DuplicateNode {
                key: node.key().to_string(),
            });
        }

        let index = table.order.len();
        table.by_key.insert(node.key().to_string(), index);
        table.order.push(node);
        Ok(())
    }

    /// All nodes, in registration order.
    pub fn get_nodes(&self) -> Vec<N> {
        self.inner.lock().order.clone()
    }

    /// Resolve a node by key.
    pub fn get_node_by_key(&self, key: &str) -> Result<N> {
        let table = self.inner.lock();
        table
            .by_key
            .get(key)
            .map(|&index| table.order[index].clone())
            .ok_or_else(|| RatsError::NodeNotFound {
                key: key.to_string(),
            })
    }

    /// Whether the node is registered.
    pub fn contains(&self, node: &N) -> bool {
        self.contains_key(node.key())
    }

    /// Whether a node with this key is registered.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.lock().by_key.contains_key(key)
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    /// Whether no node is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<N: PipelineNode> Default for NodeRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}
