//! In-memory data store.

use super::{DataStore, PortKey};
use crate::error::{RatsError, Result};
use dashmap::DashMap;

/// [`DataStore`] backed by a concurrent hash map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: DashMap<PortKey, serde_json::Value>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Load and deserialize a value.
    pub fn load_as<T: serde::de::DeserializeOwned>(&self, key: &PortKey) -> Result<T> {
        let value = self.load(key)?;
        serde_json::from_value(value).map_err(|e| RatsError::ConfigValue {
            field: key.to_string(),
            cause: e.to_string(),
        })
    }
}

impl DataStore for MemoryStore {
    fn save(&self, key: PortKey, value: serde_json::Value) -> Result<()> {
        tracing::trace!(key = %key, "Saving value");
        self.values.insert(key, value);
        Ok(())
    }

    fn load(&self, key: &PortKey) -> Result<serde_json::Value> {
        self.values
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| RatsError::DataNotFound {
                key: key.to_string(),
            })
    }

    fn contains(&self, key: &PortKey) -> bool {
        self.values.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_and_load() {
        let store = MemoryStore::new();
        store.save(PortKey::out("ingest"), json!({"rows": 3})).unwrap();

        assert!(store.contains(&PortKey::out("ingest")));
        assert_eq!(store.load(&PortKey::out("ingest")).unwrap()["rows"], 3);

        #[derive(serde::Deserialize)]
        struct Rows {
            rows: u32,
        }
        let rows: Rows = store.load_as(&PortKey::out("ingest")).unwrap();
        assert_eq!(rows.rows, 3);
    }

    #[test]
    fn missing_value_is_an_error() {
        let store = MemoryStore::new();
        let err = store.load(&PortKey::new("train", "model")).unwrap_err();
        assert!(matches!(err, RatsError::DataNotFound { ref key } if key == "train.model"));
    }
}
