//! Executable registry.

use parking_lot::Mutex;
use rats_core::error::{RatsError, Result};
use rats_core::traits::Executable;
use rats_core::types::{Node, PipelineNode};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// The executable bound to each node.
pub struct ExecutableRegistry<N: PipelineNode = Node> {
    inner: Mutex<HashMap<N, Arc<dyn Executable>>>,
}

impl<N: PipelineNode> ExecutableRegistry<N> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Bind an executable to `node`. Fails if one is already bound.
    pub fn register(&self, node: N, executable: Arc<dyn Executable>) -> Result<()> {
        let mut table = self.inner.lock();
        if table.contains_key(&node) {
            return Err(RatsError::DuplicateExecutable {
                key: node.key().to_string(),
            });
        }
        table.insert(node, executable);
        Ok(())
    }

    /// The executable bound to `node`.
    pub fn get(&self, node: &N) -> Result<Arc<dyn Executable>> {
        self.inner
            .lock()
            .get(node)
            .cloned()
            .ok_or_else(|| RatsError::ExecutableNotFound {
                key: node.key().to_string(),
            })
    }

    /// Whether an executable is bound to `node`.
    pub fn contains(&self, node: &N) -> bool {
        self.inner.lock().contains_key(node)
    }

    /// Number of bound executables.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no executable is bound.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the executable bound to `node` on the calling thread.
    ///
    /// The registry lock is released before the executable runs.
    pub fn execute(&self, node: &N) -> Result<()> {
        let executable = self.get(node)?;
        run_executable(node.key(), executable.as_ref())
    }
}

/// Run an executable, turning errors and panics into [`RatsError`].
pub(crate) fn run_executable(key: &str, executable: &dyn Executable) -> Result<()> {
    match catch_unwind(AssertUnwindSafe(|| executable.execute())) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(RatsError::NodeExecution {
            key: key.to_string(),
            source,
        }),
        Err(payload) => Err(RatsError::NodePanic {
            key: key.to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl<N: PipelineNode> Default for ExecutableRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: PipelineNode> std::fmt::Debug for ExecutableRegistry<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.inner.lock();
        let bound: Vec<(&str, &str)> = table.iter().map(|(n, e)| (n.key(), e.name())).collect();
        f.debug_struct("ExecutableRegistry")
            .field("bound", &bound)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rats_core::traits::{FnExecutable, from_fn};
    use std::error::Error as _;

    #[derive(Debug, thiserror::Error)]
    #[error("quota exceeded")]
    struct QuotaExceeded;

    #[test]
    fn duplicate_binding_rejected() {
        let registry = ExecutableRegistry::new();
        let a = Node::new("a");
        registry.register(a.clone(), Arc::new(from_fn(|| Ok(())))).unwrap();

        let err = registry
            .register(a, Arc::new(from_fn(|| Ok(()))))
            .unwrap_err();
        assert!(matches!(err, RatsError::DuplicateExecutable { .. }));
    }

    #[test]
    fn missing_binding_rejected() {
        let registry: ExecutableRegistry = ExecutableRegistry::new();
        let err = registry.execute(&Node::new("ghost")).unwrap_err();
        assert!(matches!(err, RatsError::ExecutableNotFound { ref key } if key == "ghost"));
    }

    #[test]
    fn execution_error_is_preserved() {
        let registry = ExecutableRegistry::new();
        let a = Node::new("a");
        registry
            .register(
                a.clone(),
                Arc::new(FnExecutable::new("quota", || Err(QuotaExceeded.into()))),
            )
            .unwrap();

        let err = registry.execute(&a).unwrap_err();
        assert_eq!(err.code(), "E301");
        assert!(err.source().unwrap().downcast_ref::<QuotaExceeded>().is_some());
    }

    #[test]
    fn panics_are_caught() {
        let registry = ExecutableRegistry::new();
        let a = Node::new("a");
        registry
            .register(a.clone(), Arc::new(from_fn(|| panic!("exploded"))))
            .unwrap();

        let err = registry.execute(&a).unwrap_err();
        assert!(matches!(err, RatsError::NodePanic { ref message, .. } if message == "exploded"));
    }
}
