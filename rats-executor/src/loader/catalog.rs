//! Executable kinds → factories.

use super::builtins::{CommandExecutable, FailExecutable, NoopExecutable, SleepExecutable};
use crate::container::{ServiceContainer, ServiceId};
use rats_core::error::{RatsError, Result};
use rats_core::flow::ExecutableSpec;
use rats_core::io::{DataStore, PortKey};
use rats_core::traits::Executable;
use std::sync::Arc;
use std::time::Duration;

/// What a factory gets to build one node's executable.
pub struct BuildContext<'a> {
    /// Key of the node being built.
    pub node: &'a str,
    /// The node's executable spec.
    pub spec: &'a ExecutableSpec,
    /// Store the session exchanges data through.
    pub store: Arc<dyn DataStore>,
}

impl BuildContext<'_> {
    /// Error for an invalid or missing config value of this node.
    pub fn config_error(&self, field: &str, cause: impl Into<String>) -> RatsError {
        RatsError::ConfigValue {
            field: format!("nodes[{}].executable.config.{field}", self.node),
            cause: cause.into(),
        }
    }

    /// A required string config value.
    pub fn require_string(&self, field: &str) -> Result<String> {
        self.spec
            .get_string(field)
            .map(str::to_string)
            .ok_or_else(|| self.config_error(field, "required string value is missing"))
    }
}

/// Builds an executable for one node.
pub type ExecutableFactory =
    Arc<dyn Fn(&BuildContext<'_>) -> Result<Arc<dyn Executable>> + Send + Sync>;

/// Table of executable kinds, backed by a [`ServiceContainer`].
pub struct ExecutableCatalog {
    services: ServiceContainer,
    kinds: Vec<String>,
}

impl ExecutableCatalog {
    /// Catalog with no kinds.
    pub fn empty() -> Self {
        Self {
            services: ServiceContainer::new(),
            kinds: Vec::new(),
        }
    }

    /// Catalog with the built-in kinds: `noop`, `sleep`, `command`, `fail`.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::empty();
        catalog.insert_builtin("noop", |_| Ok(Arc::new(NoopExecutable)));
        catalog.insert_builtin("sleep", |ctx| {
            let ms = ctx
                .spec
                .get_u64("ms")
                .ok_or_else(|| ctx.config_error("ms", "required integer value is missing"))?;
            Ok(Arc::new(SleepExecutable::new(Duration::from_millis(ms))))
        });
        catalog.insert_builtin("command", |ctx| {
            let program = ctx.require_string("program")?;
            let args = match ctx.spec.config.get("args") {
                None => Vec::new(),
                Some(value) => serde_yaml::from_value::<Vec<String>>(value.clone())
                    .map_err(|e| ctx.config_error("args", e.to_string()))?,
            };
            Ok(Arc::new(CommandExecutable::new(
                program,
                args,
                PortKey::out(ctx.node),
                Arc::clone(&ctx.store),
            )))
        });
        catalog.insert_builtin("fail", |ctx| {
            let message = ctx
                .spec
                .get_string("message")
                .unwrap_or("node failed on request");
            Ok(Arc::new(FailExecutable::new(message)))
        });
        catalog
    }

    /// Register a factory for `kind`.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn(&BuildContext<'_>) -> Result<Arc<dyn Executable>> + Send + Sync + 'static,
    {
        let kind = kind.into();
        let factory: ExecutableFactory = Arc::new(factory);
        self.services
            .register(&Self::service_id(&kind), move |_| Arc::clone(&factory))?;
        self.kinds.push(kind);
        Ok(())
    }

    /// Build the executable described by `ctx.spec`.
    ///
    /// An unknown kind fails with `ConfigValue`.
    pub fn build(&self, ctx: &BuildContext<'_>) -> Result<Arc<dyn Executable>> {
        let id = Self::service_id(&ctx.spec.kind);
        if !self.services.contains(&id) {
            return Err(RatsError::ConfigValue {
                field: format!("nodes[{}].executable.kind", ctx.node),
                cause: format!(
                    "unknown executable kind '{}' (known: {})",
                    ctx.spec.kind,
                    self.kinds.join(", ")
                ),
            });
        }
        let factory = self.services.get(&id)?;
        factory(ctx)
    }

    /// Whether `kind` is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.iter().any(|k| k == kind)
    }

    /// Registered kinds, in registration order.
    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }

    fn insert_builtin<F>(&mut self, kind: &str, factory: F)
    where
        F: Fn(&BuildContext<'_>) -> Result<Arc<dyn Executable>> + Send + Sync + 'static,
    {
        let factory: ExecutableFactory = Arc::new(factory);
        self.services
            .replace(&Self::service_id(kind), move |_| Arc::clone(&factory));
        self.kinds.push(kind.to_string());
    }

    fn service_id(kind: &str) -> ServiceId<ExecutableFactory> {
        ServiceId::named(format!("executable.{kind}"))
    }
}

impl Default for ExecutableCatalog {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl std::fmt::Debug for ExecutableCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutableCatalog")
            .field("kinds", &self.kinds)
            .finish()
    }
}
