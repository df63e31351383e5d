//! The synchronous session.

use super::concurrent::ConcurrentSession;
use super::handle::SessionHandle;
use crate::registry::Registries;
use crate::scheduler::{DependencyGraph, Frame, FrameReport};
use rats_core::error::{RatsError, Result};
use rats_core::io::{DataStore, MemoryStore};
use rats_core::logging::{EventKind, LogCollector, LogEvent};
use rats_core::settings::{ConcurrentSettings, SessionSettings};
use rats_core::traits::Executable;
use rats_core::types::{Node, NodeState, PipelineNode, SessionId, SessionState};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;

/// Outcome of one call to `run()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// The session that ran.
    pub session_id: SessionId,
    /// Ticks performed by this run.
    pub ticks: u64,
    /// Keys of nodes that completed, in completion order.
    pub executed: Vec<String>,
    /// Keys of nodes that failed, including nodes failed because of an upstream failure.
    pub failed: Vec<String>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// Session state when the run returned.
    pub state: SessionState,
}

impl SessionReport {
    /// Whether the run finished without any failed node.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owns the registries of one pipeline run and drives its frame until stopped.
///
/// # Example
///
/// ```ignore
/// let mut session = PipelineBuilder::new()
///     .add_node(Node::new("extract"))?
///     .add_node(Node::new("load"))?
///     .add_dependency(&Node::new("load"), &Node::new("extract"))?
///     .set_executable(&Node::new("extract"), Arc::new(from_fn(|| Ok(()))))?
///     .set_executable(&Node::new("load"), Arc::new(from_fn(|| Ok(()))))?
///     .build()?;
/// let report = session.run()?;
/// assert_eq!(report.executed, vec!["extract", "load"]);
/// ```
pub struct Session<N: PipelineNode = Node> {
    id: SessionId,
    frame: Frame<N>,
    settings: SessionSettings,
    store: Arc<dyn DataStore>,
}

impl<N: PipelineNode> Session<N> {
    /// Create a session over already populated registries.
    ///
    /// No graph validation happens here; use [`super::PipelineBuilder`] for that.
    pub fn new(registries: Registries<N>, settings: SessionSettings) -> Self {
        let id = SessionId::new();
        Self {
            id,
            frame: Frame::new(id, registries, settings.failure_policy),
            settings,
            store: Arc::new(MemoryStore::new()),
        }
    }

    /// Report node and session transitions to `collector`.
    pub fn with_log_collector(mut self, collector: Arc<dyn LogCollector>) -> Self {
        self.frame = self.frame.with_log_collector(collector);
        self
    }

    /// Name the pipeline this session runs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.frame = self.frame.with_pipeline(name);
        self
    }

    /// Attach the data store executables exchange data through.
    pub fn with_store(mut self, store: Arc<dyn DataStore>) -> Self {
        self.store = store;
        self
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Pipeline name, if any.
    pub fn name(&self) -> Option<&str> {
        self.frame.pipeline()
    }

    /// Session settings.
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// The data store attached to this session.
    pub fn store(&self) -> Arc<dyn DataStore> {
        Arc::clone(&self.store)
    }

    /// The registries owned by this session.
    pub fn registries(&self) -> &Registries<N> {
        self.frame.registries()
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.frame.registries().session_state.get()
    }

    /// A cloneable handle for stopping the session or adding nodes.
    pub fn handle(&self) -> SessionHandle<N> {
        SessionHandle::new(self.id, self.frame.registries().clone())
    }

    /// Request that the session stop; observed between ticks.
    pub fn stop(&self) {
        self.handle().stop();
    }

    /// Add a node whose prerequisites are already registered.
    pub fn add_node(
        &self,
        node: N,
        dependencies: impl IntoIterator<Item = N>,
        executable: Arc<dyn Executable>,
    ) -> Result<()> {
        self.handle().add_node(node, dependencies, executable)
    }

    /// Current state of `node`; see [`SessionHandle::node_state`].
    pub fn node_state(&self, node: &N) -> Result<NodeState> {
        self.handle().node_state(node)
    }

    /// Nodes in an order that respects every dependency, ties broken by
    /// registration order.
    pub fn execution_plan(&self) -> Result<Vec<N>> {
        let registries = self.frame.registries();
        DependencyGraph::from_registries(&registries.nodes, &registries.dependencies)
            .topological_order()
    }

    /// Perform a single tick outside of [`Session::run`].
    pub fn tick(&mut self) -> Result<FrameReport> {
        self.frame.tick()
    }

    /// Tick until the session stops.
    ///
    /// Returns an error when a node fails under `FailurePolicy::Propagate`,
    /// when an executable is missing, or when the session stops making
    /// progress. The session is `STOPPED` whenever this returns.
    #[instrument(skip(self), fields(session_id = %self.id, pipeline = ?self.frame.pipeline()))]
    pub fn run(&mut self) -> Result<SessionReport> {
        let started = Instant::now();
        let start_tick = self.frame.ticks();
        let session_state = Arc::clone(&self.frame.registries().session_state);

        session_state.set(SessionState::Running);
        tracing::info!(
            session_id = %self.id,
            nodes = self.frame.registries().nodes.len(),
            "Session started"
        );
        self.frame
            .emit(LogEvent::session(self.id, EventKind::SessionStarted));

        let mut executed = Vec::new();
        let mut failed = Vec::new();
        let mut idle_ticks = 0u32;
        let threshold = self.settings.deadlock_threshold.max(1);

        while session_state.is_running() {
            let report = match self.frame.tick() {
                Ok(report) => report,
                Err(err) => {
                    session_state.set(SessionState::Stopped);
                    self.frame.emit(LogEvent::session(
                        self.id,
                        EventKind::SessionAborted {
                            code: err.code().to_string(),
                            error: err.to_string(),
                        },
                    ));
                    return Err(err);
                }
            };

            executed.extend(report.executed.iter().cloned());
            failed.extend(report.failed.iter().cloned());

            if report.made_progress() {
                idle_ticks = 0;
            } else {
                idle_ticks += 1;
            }

            let ticks = self.frame.ticks() - start_tick;
            let over_budget = self.settings.max_ticks.is_some_and(|max| ticks >= max);
            if session_state.is_running()
                && (idle_ticks >= threshold || over_budget)
            {
                return Err(self.deadlock(ticks));
            }
        }

        let report = SessionReport {
            session_id: self.id,
            ticks: self.frame.ticks() - start_tick,
            executed,
            failed,
            elapsed: started.elapsed(),
            state: session_state.get(),
        };

        tracing::info!(
            session_id = %self.id,
            ticks = report.ticks,
            executed = report.executed.len(),
            failed = report.failed.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Session finished"
        );
        Ok(report)
    }

    /// Turn this session into one that runs pending nodes concurrently.
    pub fn into_concurrent(self, settings: ConcurrentSettings) -> ConcurrentSession<N> {
        ConcurrentSession::from_parts(self.id, self.frame, self.settings, settings, self.store)
    }

    fn deadlock(&self, ticks: u64) -> RatsError {
        self.frame.registries().session_state.set(SessionState::Stopped);
        let nodes: Vec<String> = self
            .frame
            .unfinished_nodes()
            .iter()
            .map(|node| node.key().to_string())
            .collect();

        tracing::error!(session_id = %self.id, ticks, unfinished = ?nodes, "Session deadlocked");
        self.frame.emit(LogEvent::session(
            self.id,
            EventKind::Deadlocked {
                ticks,
                unfinished: nodes.clone(),
            },
        ));

        RatsError::Deadlock {
            session_id: self.id,
            ticks,
            nodes,
        }
    }
}

impl<N: PipelineNode> std::fmt::Debug for Session<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("settings", &self.settings)
            .field("frame", &self.frame)
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
    fn empty_session_stops_on_first_tick() {
        let mut session: Session = Session::new(Registries::new(), SessionSettings::default());
        let report = session.run().unwrap();
        assert_eq!(report.ticks, 1);
        assert_eq!(report.state, SessionState::Stopped);
        assert!(report.is_success());
    }

    #[test]
    fn unadmitted_node_reports_registered() {
        let session: Session = Session::new(Registries::new(), SessionSettings::default());
        session.add_node(Node::new("a"), [], noop()).unwrap();
        assert_eq!(session.node_state(&Node::new("a")).unwrap(), NodeState::Registered);

        let err = session.node_state(&Node::new("ghost")).unwrap_err();
        assert_eq!(err.code(), "E107");
    }

    #[test]
    fn add_node_rejects_unknown_prerequisite() {
        let session: Session = Session::new(Registries::new(), SessionSettings::default());
        let err = session
            .add_node(Node::new("b"), [Node::new("a")], noop())
            .unwrap_err();
        assert!(matches!(err, RatsError::UnknownDependency { .. }));
        assert!(session.registries().nodes.is_empty());
    }

    #[test]
    fn run_can_resume_after_stop() {
        let registries: Registries = Registries::new();
        let session = Session::new(registries, SessionSettings::default());
        let handle = session.handle();
        session.add_node(Node::new("a"), [], noop()).unwrap();
        session
            .add_node(
                Node::new("b"),
                [],
                Arc::new(from_fn(move || {
                    handle.stop();
                    Ok(())
                })),
            )
            .unwrap();
        session.add_node(Node::new("c"), [], noop()).unwrap();
        let mut session = session;

        let first = session.run().unwrap();
        assert_eq!(first.executed, vec!["a", "b"]);
        assert_eq!(session.node_state(&Node::new("c")).unwrap(), NodeState::Pending);

        let second = session.run().unwrap();
        assert_eq!(second.executed, vec!["c"]);
        assert_eq!(session.state(), SessionState::Stopped);
    }
}
