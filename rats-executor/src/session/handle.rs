//! Cloneable control handle for a session.

use crate::registry::Registries;
use rats_core::error::{RatsError, Result};
use rats_core::traits::Executable;
use rats_core::types::{Node, NodeState, PipelineNode, SessionId, SessionState};
use std::sync::Arc;

/// A handle that can stop a session or add nodes to it while it runs.
///
/// Executables may capture a handle. Both operations are observed by the run
/// loop between ticks, never in the middle of one.
pub struct SessionHandle<N: PipelineNode = Node> {
    session_id: SessionId,
    registries: Registries<N>,
}

impl<N: PipelineNode> SessionHandle<N> {
    pub(crate) fn new(session_id: SessionId, registries: Registries<N>) -> Self {
        Self {
            session_id,
            registries,
        }
    }

    /// The session this handle controls.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Request that the session stop after the current tick.
    pub fn stop(&self) {
        let previous = self.registries.session_state.set(SessionState::Stopped);
        if previous != SessionState::Stopped {
            tracing::info!(session_id = %self.session_id, "Session stop requested");
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.registries.session_state.get()
    }

    /// Whether the run loop is ticking.
    pub fn is_running(&self) -> bool {
        self.registries.session_state.is_running()
    }

    /// Add a node with its prerequisites and executable.
    ///
    /// Every prerequisite must already be registered, so a node added this way
    /// can never close a cycle. The node is admitted as `REGISTERED` by the
    /// next tick.
    pub fn add_node(
        &self,
        node: N,
        dependencies: impl IntoIterator<Item = N>,
        executable: Arc<dyn Executable>,
    ) -> Result<()> {
        let dependencies: Vec<N> = dependencies.into_iter().collect();
        if let Some(missing) = dependencies
            .iter()
            .find(|dep| !self.registries.nodes.contains(dep))
        {
            return Err(RatsError::UnknownDependency {
                key: node.key().to_string(),
                dependency: missing.key().to_string(),
            });
        }
        if self.registries.nodes.contains(&node) {
            return Err(RatsError::DuplicateNode {
                key: node.key().to_string(),
            });
        }

        // Executable and dependencies go in first so the frame never sees a
        // half-wired node.
        self.registries.executables.register(node.clone(), executable)?;
        if !dependencies.is_empty() {
            self.registries
                .dependencies
                .register_dependencies(&node, dependencies)?;
        }
        self.registries.nodes.register(node.clone())?;

        tracing::debug!(session_id = %self.session_id, node = node.key(), "Node added");
        Ok(())
    }

    /// Current state of `node`.
    ///
    /// A node that is registered but not yet admitted by a tick reports
    /// `REGISTERED`. Unknown nodes fail with `NodeStateNotFound`.
    pub fn node_state(&self, node: &N) -> Result<NodeState> {
        if !self.registries.states.has_state(node) && self.registries.nodes.contains(node) {
            return Ok(NodeState::Registered);
        }
        self.registries.states.get_node_state(node)
    }
}

impl<N: PipelineNode> Clone for SessionHandle<N> {
    fn clone(&self) -> Self {
        Self {
            session_id: self.session_id,
            registries: self.registries.clone(),
        }
    }
}

impl<N: PipelineNode> std::fmt::Debug for SessionHandle<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session_id", &self.session_id)
            .field("state", &self.state())
            .finish()
    }
}
