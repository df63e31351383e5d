//! Node identity.

use crate::error::{RatsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Anything the scheduler can track.
///
/// Equality and hashing must agree with [`PipelineNode::key`]: two nodes with
/// the same key are the same node as far as every registry is concerned.
pub trait PipelineNode: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// The unique key of this node.
    fn key(&self) -> &str;
}

/// A unit of schedulable work, identified by its key.
///
/// Nodes are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Node {
    key: String,
}

impl Node {
    /// Create a node.
    ///
    /// # Panics
    /// Panics if `key` is empty. Use [`Node::try_new`] for untrusted input.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        assert!(!key.is_empty(), "node key must not be empty");
        Self { key }
    }

    /// Create a node, rejecting empty keys.
    pub fn try_new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(RatsError::InvalidDefinition {
                cause: "node key must not be empty".to_string(),
            });
        }
        Ok(Self { key })
    }

    /// The node key.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl PipelineNode for Node {
    fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl From<&str> for Node {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn nodes_compare_by_key() {
        assert_eq!(Node::new("a"), Node::from("a"));
        assert_ne!(Node::new("a"), Node::new("b"));

        let set: HashSet<Node> = ["a", "b", "a"].into_iter().map(Node::new).collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn empty_key_rejected() {
        assert!(Node::try_new("").is_err());
        assert!(Node::try_new("  ").is_err());
        assert_eq!(Node::try_new("ingest").unwrap().key(), "ingest");
    }

    #[test]
    fn serde_is_transparent() {
        let json = serde_json::to_string(&Node::new("train")).unwrap();
        assert_eq!(json, "\"train\"");
    }
}
