//! Registries shared by the frame controller and the session.
//!
//! Each registry guards its contents with a single lock, so one instance can
//! be read and written from several threads. Registries hold data only; the
//! transition discipline lives in [`crate::scheduler::Frame`].

mod dependencies;
mod executables;
mod nodes;
mod session_state;
mod states;

pub use dependencies::DependencyRegistry;
pub use executables::ExecutableRegistry;
pub use nodes::NodeRegistry;
pub use session_state::SessionStateRegistry;
pub use states::NodeStateRegistry;

pub(crate) use executables::run_executable;

use rats_core::types::{Node, PipelineNode};
use std::sync::Arc;

/// The full set of registries owned by one session.
#[derive(Debug)]
pub struct Registries<N: PipelineNode = Node> {
    /// Every node of the pipeline.
    pub nodes: Arc<NodeRegistry<N>>,
    /// Prerequisites per node.
    pub dependencies: Arc<DependencyRegistry<N>>,
    /// Lifecycle state per node.
    pub states: Arc<NodeStateRegistry<N>>,
    /// Executable per node.
    pub executables: Arc<ExecutableRegistry<N>>,
    /// Overall session state.
    pub session_state: Arc<SessionStateRegistry>,
}

impl<N: PipelineNode> Registries<N> {
    /// Create an empty set of registries.
    pub fn new() -> Self {
        Self {
            nodes: Arc::new(NodeRegistry::new()),
            dependencies: Arc::new(DependencyRegistry::new()),
            states: Arc::new(NodeStateRegistry::new()),
            executables: Arc::new(ExecutableRegistry::new()),
            session_state: Arc::new(SessionStateRegistry::new()),
        }
    }
}

impl<N: PipelineNode> Default for Registries<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: PipelineNode> Clone for Registries<N> {
    fn clone(&self) -> Self {
        Self {
            nodes: Arc::clone(&self.nodes),
            dependencies: Arc::clone(&self.dependencies),
            states: Arc::clone(&self.states),
            executables: Arc::clone(&self.executables),
            session_state: Arc::clone(&self.session_state),
        }
    }
}
