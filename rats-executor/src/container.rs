//! Typed service container.
//!
//! An explicit table from identifiers to factory closures, filled once at the
//! composition root. Every [`ServiceContainer::get`] calls the factory again;
//! register a factory that clones an `Arc` to share one instance.
//!
//! ```ignore
//! const STORE: ServiceId<Arc<dyn DataStore>> = ServiceId::new("rats.store");
//!
//! let mut services = ServiceContainer::new();
//! let store: Arc<dyn DataStore> = Arc::new(MemoryStore::new());
//! services.register(&STORE, move |_| Arc::clone(&store))?;
//! let store = services.get(&STORE)?;
//! ```

use rats_core::error::{RatsError, Result};
use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Identifier of a service producing values of type `T`.
pub struct ServiceId<T> {
    name: Cow<'static, str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ServiceId<T> {
    /// Identifier with a static name, usable in `const` items.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _marker: PhantomData,
        }
    }

    /// Identifier with a name computed at runtime.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            _marker: PhantomData,
        }
    }

    /// The identifier's name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Clone for ServiceId<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ServiceId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceId").field(&self.name).finish()
    }
}

impl<T> fmt::Display for ServiceId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

type Factory<T> = Arc<dyn Fn(&ServiceContainer) -> T + Send + Sync>;

/// Identifier → factory table.
#[derive(Default)]
pub struct ServiceContainer {
    factories: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl ServiceContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory for `id`.
    ///
    /// The factory receives the container so it can resolve its own
    /// collaborators.
    pub fn register<T, F>(&mut self, id: &ServiceId<T>, factory: F) -> Result<()>
    where
        T: 'static,
        F: Fn(&ServiceContainer) -> T + Send + Sync + 'static,
    {
        if self.factories.contains_key(id.name()) {
            return Err(RatsError::DuplicateService {
                name: id.name().to_string(),
            });
        }
        let factory: Factory<T> = Arc::new(factory);
        self.factories.insert(id.name().to_string(), Box::new(factory));
        Ok(())
    }

    /// Register the factory for `id`, replacing any earlier one.
    ///
    /// Returns whether a factory was replaced.
    pub fn replace<T, F>(&mut self, id: &ServiceId<T>, factory: F) -> bool
    where
        T: 'static,
        F: Fn(&ServiceContainer) -> T + Send + Sync + 'static,
    {
        let factory: Factory<T> = Arc::new(factory);
        self.factories
            .insert(id.name().to_string(), Box::new(factory))
            .is_some()
    }

    /// Produce a value from the factory registered for `id`.
    ///
    /// Fails with `ServiceNotFound` when nothing is registered under the name,
    /// or when it was registered for a different type.
    pub fn get<T: 'static>(&self, id: &ServiceId<T>) -> Result<T> {
        let factory = self
            .factories
            .get(id.name())
            .and_then(|entry| entry.downcast_ref::<Factory<T>>())
            .ok_or_else(|| RatsError::ServiceNotFound {
                name: id.name().to_string(),
            })?;
        Ok(factory(self))
    }

    /// Whether a factory is registered under `id`.
    pub fn contains<T>(&self, id: &ServiceId<T>) -> bool {
        self.factories.contains_key(id.name())
    }

    /// Registered identifiers, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no factory is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("services", &self.names())
            .finish()
    }
}
