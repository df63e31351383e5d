//! PipelineBuilder - wires nodes, dependencies and executables into a session.

use super::runner::Session;
use crate::registry::Registries;
use crate::scheduler::DependencyGraph;
use rats_core::error::{RatsError, Result};
use rats_core::io::{DataStore, MemoryStore};
use rats_core::logging::LogCollector;
use rats_core::settings::SessionSettings;
use rats_core::traits::Executable;
use rats_core::types::{Node, NodeState, PipelineNode};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Builder for a [`Session`].
///
/// Registration mistakes (duplicate node, duplicate executable, unknown node)
/// fail immediately. Graph-level problems (dependencies on nodes that were never
/// added, cycles) fail in [`PipelineBuilder::build`]. A node without an
/// executable is accepted and fails when the frame tries to run it.
pub struct PipelineBuilder<N: PipelineNode = Node> {
    name: Option<String>,
    nodes: Vec<N>,
    known: HashSet<N>,
    dependencies: HashMap<N, Vec<N>>,
    executables: Vec<(N, Arc<dyn Executable>)>,
    settings: SessionSettings,
    log_collector: Option<Arc<dyn LogCollector>>,
    store: Arc<dyn DataStore>,
}

impl<N: PipelineNode> PipelineBuilder<N> {
    /// Create an empty builder with default settings and an in-memory store.
    pub fn new() -> Self {
        Self {
            name: None,
            nodes: Vec::new(),
            known: HashSet::new(),
            dependencies: HashMap::new(),
            executables: Vec::new(),
            settings: SessionSettings::default(),
            log_collector: None,
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Name the pipeline.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the session settings.
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Report transitions to `collector`.
    pub fn with_log_collector(mut self, collector: Arc<dyn LogCollector>) -> Self {
        self.log_collector = Some(collector);
        self
    }

    /// Replace the data store handed to the session.
    pub fn with_store(mut self, store: Arc<dyn DataStore>) -> Self {
        self.store = store;
        self
    }

    /// The data store the session will use, for executables that capture it.
    pub fn store(&self) -> Arc<dyn DataStore> {
        Arc::clone(&self.store)
    }

    /// Add a node.
    pub fn add_node(mut self, node: N) -> Result<Self> {
        if !self.known.insert(node.clone()) {
            return Err(RatsError::DuplicateNode {
                key: node.key().to_string(),
            });
        }
        self.nodes.push(node);
        Ok(self)
    }

    /// Declare that `node` requires `dependency` to complete first.
    ///
    /// `dependency` may be added after this call; it is checked in `build()`.
    pub fn add_dependency(self, node: &N, dependency: &N) -> Result<Self> {
        self.add_dependencies(node, [dependency.clone()])
    }

    /// Declare several prerequisites of `node` at once.
    pub fn add_dependencies(
        mut self,
        node: &N,
        dependencies: impl IntoIterator<Item = N>,
    ) -> Result<Self> {
        self.require_known(node)?;
        let entry = self.dependencies.entry(node.clone()).or_default();
        for dependency in dependencies {
            if !entry.contains(&dependency) {
                entry.push(dependency);
            }
        }
        Ok(self)
    }

    /// Bind the executable that runs for `node`.
    pub fn set_executable(mut self, node: &N, executable: Arc<dyn Executable>) -> Result<Self> {
        self.require_known(node)?;
        if self.executables.iter().any(|(bound, _)| bound == node) {
            return Err(RatsError::DuplicateExecutable {
                key: node.key().to_string(),
            });
        }
        self.executables.push((node.clone(), executable));
        Ok(self)
    }

    /// Populate a fresh set of registries, validate the graph and create the session.
    ///
    /// Every node starts in `REGISTERED`.
    pub fn build(self) -> Result<Session<N>> {
        let registries = self.build_registries()?;

        let mut session = Session::new(registries, self.settings).with_store(self.store);
        if let Some(collector) = self.log_collector {
            session = session.with_log_collector(collector);
        }
        if let Some(name) = self.name {
            session = session.with_name(name);
        }

        tracing::debug!(
            session_id = %session.id(),
            nodes = self.nodes.len(),
            "Pipeline built"
        );
        Ok(session)
    }

    fn build_registries(&self) -> Result<Registries<N>> {
        let registries = Registries::new();

        for node in &self.nodes {
            registries.nodes.register(node.clone())?;
        }
        for node in &self.nodes {
            if let Some(dependencies) = self.dependencies.get(node) {
                registries
                    .dependencies
                    .register_dependencies(node, dependencies.iter().cloned())?;
            }
        }
        for (node, executable) in &self.executables {
            registries
                .executables
                .register(node.clone(), Arc::clone(executable))?;
        }

        DependencyGraph::from_registries(&registries.nodes, &registries.dependencies).validate()?;

        for node in &self.nodes {
            registries.states.set_node_state(node, NodeState::Registered);
        }
        Ok(registries)
    }

    fn require_known(&self, node: &N) -> Result<()> {
        if self.known.contains(node) {
            Ok(())
        } else {
            Err(RatsError::NodeNotFound {
                key: node.key().to_string(),
            })
        }
    }
}

impl<N: PipelineNode> Default for PipelineBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: PipelineNode> std::fmt::Debug for PipelineBuilder<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("name", &self.name)
            .field("nodes", &self.nodes)
            .field("dependencies", &self.dependencies)
            .field("executables", &self.executables.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rats_core::traits::from_fn;

    fn noop() -> Arc<dyn Executable> {
        Arc::new(from_fn(|| Ok(())))
    }

    #[test]
    fn duplicate_node_rejected_immediately() {
        let err = PipelineBuilder::new()
            .add_node(Node::new("a"))
            .unwrap()
            .add_node(Node::new("a"))
            .unwrap_err();
        assert!(matches!(err, RatsError::DuplicateNode { ref key } if key == "a"));
    }

    #[test]
    fn dependency_on_unadded_node_fails_in_build() {
        let err = PipelineBuilder::new()
            .add_node(Node::new("b"))
            .unwrap()
            .add_dependency(&Node::new("b"), &Node::new("a"))
            .unwrap()
            .build()
            .unwrap_err();
        assert!(matches!(err, RatsError::UnknownDependency { .. }));
    }

    #[test]
    fn cycle_fails_in_build() {
        let a = Node::new("a");
        let b = Node::new("b");
        let err = PipelineBuilder::new()
            .add_node(a.clone())
            .unwrap()
            .add_node(b.clone())
            .unwrap()
            .add_dependency(&a, &b)
            .unwrap()
            .add_dependency(&b, &a)
            .unwrap()
            .build()
            .unwrap_err();
        assert_eq!(err.code(), "E202");
    }

    #[test]
    fn executable_requires_known_node_and_is_single() {
        let a = Node::new("a");
        let err = PipelineBuilder::new()
            .set_executable(&a, noop())
            .unwrap_err();
        assert!(matches!(err, RatsError::NodeNotFound { .. }));

        let err = PipelineBuilder::new()
            .add_node(a.clone())
            .unwrap()
            .set_executable(&a, noop())
            .unwrap()
            .set_executable(&a, noop())
            .unwrap_err();
        assert!(matches!(err, RatsError::DuplicateExecutable { .. }));
    }

    #[test]
    fn build_registers_everything_once() {
        let a = Node::new("a");
        let b = Node::new("b");
        let session = PipelineBuilder::new()
            .name("etl")
            .add_node(a.clone())
            .unwrap()
            .add_node(b.clone())
            .unwrap()
            .add_dependency(&b, &a)
            .unwrap()
            .add_dependency(&b, &a)
            .unwrap()
            .set_executable(&a, noop())
            .unwrap()
            .build()
            .unwrap();

        let registries = session.registries();
        assert_eq!(registries.nodes.len(), 2);
        assert_eq!(registries.dependencies.get_dependencies(&b).len(), 1);
        assert!(!registries.dependencies.has_registration(&a));
        assert_eq!(registries.executables.len(), 1);
        assert_eq!(session.node_state(&a).unwrap(), NodeState::Registered);
        assert_eq!(session.name(), Some("etl"));
    }
}
