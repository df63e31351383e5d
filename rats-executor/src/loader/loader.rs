//! PipelineLoader - turns YAML definitions into sessions.

use super::catalog::{BuildContext, ExecutableCatalog};
use crate::container::{ServiceContainer, ServiceId};
use crate::session::{PipelineBuilder, Session};
use rats_core::error::Result;
use rats_core::flow::PipelineDefinition;
use rats_core::io::{DataStore, MemoryStore};
use rats_core::logging::{LogCollector, NullCollector};
use rats_core::settings::SessionSettings;
use rats_core::types::Node;
use std::path::Path;
use std::sync::Arc;

/// Service holding the data store handed to sessions and executables.
pub const STORE: ServiceId<Arc<dyn DataStore>> = ServiceId::new("rats.store");

/// Service holding the collector sessions report transitions to.
pub const LOG_COLLECTOR: ServiceId<Arc<dyn LogCollector>> = ServiceId::new("rats.log_collector");

/// Configuration for the pipeline loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    /// Skip structural validation of the definition.
    ///
    /// The builder still rejects unknown dependencies and cycles.
    pub skip_validation: bool,
    /// Settings that replace the definition's own `settings` block.
    pub settings_override: Option<SessionSettings>,
}

impl LoaderConfig {
    /// Replace the definition's settings with `settings`.
    pub fn with_settings_override(mut self, settings: SessionSettings) -> Self {
        self.settings_override = Some(settings);
        self
    }
}

/// Builds sessions from [`PipelineDefinition`]s.
pub struct PipelineLoader {
    catalog: ExecutableCatalog,
    services: ServiceContainer,
    config: LoaderConfig,
}

impl PipelineLoader {
    /// Loader with the built-in executable kinds, an in-memory store and no
    /// log collector.
    pub fn new() -> Self {
        let mut services = ServiceContainer::new();
        let store: Arc<dyn DataStore> = Arc::new(MemoryStore::new());
        let collector: Arc<dyn LogCollector> = Arc::new(NullCollector);
        services.replace(&STORE, move |_| Arc::clone(&store));
        services.replace(&LOG_COLLECTOR, move |_| Arc::clone(&collector));

        Self {
            catalog: ExecutableCatalog::with_builtins(),
            services,
            config: LoaderConfig::default(),
        }
    }

    /// Use a different executable catalog.
    pub fn with_catalog(mut self, catalog: ExecutableCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Use a different loader configuration.
    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Share `store` with every session and executable built by this loader.
    pub fn with_store(mut self, store: Arc<dyn DataStore>) -> Self {
        self.services.replace(&STORE, move |_| Arc::clone(&store));
        self
    }

    /// Report every loaded session's transitions to `collector`.
    pub fn with_log_collector(mut self, collector: Arc<dyn LogCollector>) -> Self {
        self.services
            .replace(&LOG_COLLECTOR, move |_| Arc::clone(&collector));
        self
    }

    /// The executable catalog.
    pub fn catalog(&self) -> &ExecutableCatalog {
        &self.catalog
    }

    /// The services available to this loader.
    pub fn services(&self) -> &ServiceContainer {
        &self.services
    }

    /// Load a YAML file.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Session> {
        let definition = PipelineDefinition::from_file(path.as_ref())?;
        self.load(&definition)
    }

    /// Load a YAML string.
    pub fn load_str(&self, yaml: &str) -> Result<Session> {
        let definition = PipelineDefinition::from_yaml(yaml)?;
        self.load(&definition)
    }

    /// Build a session from a parsed definition.
    ///
    /// Nodes are registered in document order, which is also the order the
    /// frame executes ready nodes in.
    pub fn load(&self, definition: &PipelineDefinition) -> Result<Session> {
        if !self.config.skip_validation {
            definition.ensure_valid()?;
        }

        let store = self.services.get(&STORE)?;
        let collector = self.services.get(&LOG_COLLECTOR)?;
        let settings = self
            .config
            .settings_override
            .clone()
            .unwrap_or_else(|| definition.settings.clone());

        let mut builder = PipelineBuilder::new()
            .name(&definition.name)
            .with_settings(settings)
            .with_store(Arc::clone(&store))
            .with_log_collector(collector);

        let keys = definition
            .nodes
            .iter()
            .map(|node| Node::try_new(&node.key))
            .collect::<Result<Vec<_>>>()?;
        for key in &keys {
            builder = builder.add_node(key.clone())?;
        }
        for (node, key) in definition.nodes.iter().zip(&keys) {
            if !node.depends_on.is_empty() {
                let dependencies = node
                    .depends_on
                    .iter()
                    .map(Node::try_new)
                    .collect::<Result<Vec<_>>>()?;
                builder = builder.add_dependencies(key, dependencies)?;
            }
            let executable = self.catalog.build(&BuildContext {
                node: &node.key,
                spec: &node.executable,
                store: Arc::clone(&store),
            })?;
            builder = builder.set_executable(key, executable)?;
        }

        let session = builder.build()?;
        tracing::info!(
            session_id = %session.id(),
            pipeline = %definition.name,
            nodes = definition.nodes.len(),
            "Pipeline loaded"
        );
        Ok(session)
    }
}

impl Default for PipelineLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PipelineLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineLoader")
            .field("catalog", &self.catalog)
            .field("services", &self.services)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rats_core::logging::BufferedCollector;
    use rats_core::settings::FailurePolicy;
    use rats_core::types::NodeState;

    const LINEAR: &str = r#"
name: linear
nodes:
  - key: extract
  - key: transform
    depends_on: [extract]
  - key: load
    depends_on: [transform]
"#;

    #[test]
    fn load_and_run_linear_pipeline() {
        let mut session = PipelineLoader::new().load_str(LINEAR).unwrap();
        assert_eq!(session.name(), Some("linear"));

        let report = session.run().unwrap();
        assert_eq!(report.executed, vec!["extract", "transform", "load"]);
        assert_eq!(
            session.node_state(&Node::new("load")).unwrap(),
            NodeState::Completed
        );
    }

    #[test]
    fn invalid_definition_is_rejected() {
        let yaml = "name: bad\nnodes:\n  - key: a\n  - key: a\n";
        let err = PipelineLoader::new().load_str(yaml).unwrap_err();
        assert_eq!(err.code(), "E401");
    }

    #[test]
    fn empty_dependency_key_is_an_error_without_validation() {
        let yaml = "name: p\nnodes:\n  - key: a\n    depends_on: [\"\"]\n";
        let loader = PipelineLoader::new().with_config(LoaderConfig {
            skip_validation: true,
            ..LoaderConfig::default()
        });
        let err = loader.load_str(yaml).unwrap_err();
        assert_eq!(err.code(), "E401");
    }

    #[test]
    fn zero_deadlock_threshold_still_converges() {
        let yaml = "name: p\nsettings:\n  deadlock_threshold: 0\nnodes:\n  - key: a\n  - key: b\n    depends_on: [a]\n";
        let mut session = PipelineLoader::new().load_str(yaml).unwrap();
        assert_eq!(session.settings().deadlock_threshold, 0);

        let report = session.run().unwrap();
        assert_eq!(report.executed, vec!["a", "b"]);
    }

    #[test]
    fn cycle_is_rejected_even_without_validation() {
        let yaml = "name: loop\nnodes:\n  - key: a\n    depends_on: [b]\n  - key: b\n    depends_on: [a]\n";
        let loader = PipelineLoader::new().with_config(LoaderConfig {
            skip_validation: true,
            ..LoaderConfig::default()
        });
        assert_eq!(loader.load_str(yaml).unwrap_err().code(), "E202");
    }

    #[test]
    fn settings_override_and_collector_are_applied() {
        let yaml = "name: p\nnodes:\n  - key: boom\n    executable:\n      kind: fail\n  - key: after\n    depends_on: [boom]\n";
        let collector = Arc::new(BufferedCollector::with_default_capacity());
        let loader = PipelineLoader::new()
            .with_log_collector(collector.clone())
            .with_config(LoaderConfig::default().with_settings_override(
                SessionSettings::default().with_failure_policy(FailurePolicy::Continue),
            ));

        let mut session = loader.load_str(yaml).unwrap();
        let report = session.run().unwrap();
        assert_eq!(report.failed, vec!["boom", "after"]);
        assert!(!collector.by_node(session.id(), "boom").is_empty());
    }
}
