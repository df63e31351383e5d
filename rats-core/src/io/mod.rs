//! Data exchange between nodes.
//!
//! The scheduler only knows that a dependency exists; the data that flows
//! across it goes through a [`DataStore`] keyed by `(node, port)`. Executables
//! capture a store at construction time and read their upstream outputs from it.

mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of one output of one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortKey {
    /// Producing node key.
    pub node: String,
    /// Output port name.
    pub port: String,
}

impl PortKey {
    /// Create a port key.
    pub fn new(node: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            port: port.into(),
        }
    }

    /// The default `out` port of a node.
    pub fn out(node: impl Into<String>) -> Self {
        Self::new(node, "out")
    }
}

impl fmt::Display for PortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.port)
    }
}

/// Opaque key/value storage shared by executables.
pub trait DataStore: Send + Sync {
    /// Store a value, replacing any previous value.
    fn save(&self, key: PortKey, value: serde_json::Value) -> Result<()>;

    /// Load a value; fails with `DataNotFound` if nothing was saved.
    fn load(&self, key: &PortKey) -> Result<serde_json::Value>;

    /// Whether a value exists for the key.
    fn contains(&self, key: &PortKey) -> bool;
}
