//! Concurrent session on tokio blocking tasks.

use super::handle::SessionHandle;
use super::runner::SessionReport;
use crate::registry::{Registries, run_executable};
use crate::scheduler::Frame;
use rats_core::error::{RatsError, Result};
use rats_core::io::DataStore;
use rats_core::logging::{EventKind, LogEvent};
use rats_core::settings::{ConcurrentSettings, SessionSettings};
use rats_core::types::{Node, NodeState, PipelineNode, SessionId, SessionState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{Id, JoinSet};
use tracing::instrument;

/// Result of one node task.
type NodeTaskResult<N> = (N, Result<()>);

/// A session that runs every pending node at once, up to a limit.
///
/// Each round promotes nodes exactly like [`Frame::tick`], then hands pending
/// nodes to `spawn_blocking`. A node becomes `COMPLETED` only after its task
/// has been joined, so no state is claimed for work that has not finished.
///
/// When a node failure is fatal, no further node is launched, in-flight tasks
/// are drained so that their nodes reach a terminal state, and the error is
/// returned.
pub struct ConcurrentSession<N: PipelineNode = Node> {
    id: SessionId,
    frame: Frame<N>,
    settings: SessionSettings,
    concurrency: ConcurrentSettings,
    store: Arc<dyn DataStore>,
}

impl<N: PipelineNode> ConcurrentSession<N> {
    pub(crate) fn from_parts(
        id: SessionId,
        frame: Frame<N>,
        settings: SessionSettings,
        concurrency: ConcurrentSettings,
        store: Arc<dyn DataStore>,
    ) -> Self {
        Self {
            id,
            frame,
            settings,
            concurrency,
            store,
        }
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Concurrency settings.
    pub fn concurrency(&self) -> &ConcurrentSettings {
        &self.concurrency
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

    /// Request that the session stop; in-flight nodes still run to completion.
    pub fn stop(&self) {
        self.handle().stop();
    }

    /// Current state of `node`; see [`SessionHandle::node_state`].
    pub fn node_state(&self, node: &N) -> Result<NodeState> {
        self.handle().node_state(node)
    }

    /// Run until every node is terminal, the session is stopped, or a fatal
    /// failure occurs.
    #[instrument(
        skip(self),
        fields(
            session_id = %self.id,
            max_concurrent = %self.concurrency.max_concurrent_nodes,
        )
    )]
    pub async fn run(&mut self) -> Result<SessionReport> {
        let started = Instant::now();
        let registries = self.frame.registries().clone();
        let session_state = Arc::clone(&registries.session_state);

        session_state.set(SessionState::Running);
        tracing::info!(session_id = %self.id, nodes = registries.nodes.len(), "Session started");
        self.frame
            .emit(LogEvent::session(self.id, EventKind::SessionStarted));

        let mut tasks: JoinSet<NodeTaskResult<N>> = JoinSet::new();
        let mut in_flight: HashMap<Id, N> = HashMap::new();
        let threshold = self.settings.deadlock_threshold.max(1);
        let mut fatal: Option<RatsError> = None;
        let mut executed = Vec::new();
        let mut failed = Vec::new();
        let mut rounds = 0u64;
        let mut idle_rounds = 0u32;

        loop {
            let mut progressed = false;

            if fatal.is_none() && session_state.is_running() {
                rounds += 1;
                progressed |= !self.frame.promote_registered().is_empty();
                progressed |= !self.frame.admit_new_nodes().is_empty();
                progressed |= !self.frame.promote_queued().is_empty();

                let blocked = self.frame.fail_blocked();
                progressed |= !blocked.is_empty();
                failed.extend(blocked.iter().map(|node| node.key().to_string()));

                match self.launch_pending(&mut tasks, &mut in_flight) {
                    Ok(launched) => progressed |= launched > 0,
                    Err((node, err)) => {
                        failed.push(node.key().to_string());
                        fatal = Some(err);
                    }
                }
            }

            if tasks.is_empty() {
                if fatal.is_some() || !session_state.is_running() {
                    break;
                }
                if self.frame.check_completion() {
                    break;
                }

                idle_rounds = if progressed { 0 } else { idle_rounds + 1 };
                let over_budget = self.settings.max_ticks.is_some_and(|max| rounds >= max);
                if idle_rounds >= threshold || over_budget {
                    return Err(self.deadlock(rounds));
                }
                tokio::task::yield_now().await;
                continue;
            }
            idle_rounds = 0;

            let Some(joined) = tasks.join_next_with_id().await else {
                continue;
            };

            let (node, result) = match joined {
                Ok((id, (node, result))) => {
                    in_flight.remove(&id);
                    (node, result)
                }
                Err(join_error) => {
                    let Some(node) = in_flight.remove(&join_error.id()) else {
                        continue;
                    };
                    let message = if join_error.is_panic() {
                        "node task panicked".to_string()
                    } else {
                        "node task was cancelled".to_string()
                    };
                    let err = RatsError::NodePanic {
                        key: node.key().to_string(),
                        message,
                    };
                    // A lost task is fatal whatever the failure policy.
                    self.frame.transition(&node, NodeState::Failed);
                    self.frame.record_failure(&node, &err);
                    failed.push(node.key().to_string());
                    fatal.get_or_insert(err);
                    continue;
                }
            };

            match result {
                Ok(()) => {
                    self.frame.transition(&node, NodeState::Completed);
                    executed.push(node.key().to_string());
                }
                Err(err) => {
                    self.frame.transition(&node, NodeState::Failed);
                    self.frame.record_failure(&node, &err);
                    failed.push(node.key().to_string());
                    if self.frame.is_fatal(&err) && fatal.is_none() {
                        fatal = Some(err);
                    }
                }
            }
        }

        if let Some(err) = fatal {
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

        let report = SessionReport {
            session_id: self.id,
            ticks: rounds,
            executed,
            failed,
            elapsed: started.elapsed(),
            state: session_state.get(),
        };
        tracing::info!(
            session_id = %self.id,
            rounds = report.ticks,
            executed = report.executed.len(),
            failed = report.failed.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Session finished"
        );
        Ok(report)
    }

    /// Spawn pending nodes until the concurrency limit is reached.
    ///
    /// A node without an executable is marked `FAILED` and returned with its error.
    fn launch_pending(
        &self,
        tasks: &mut JoinSet<NodeTaskResult<N>>,
        in_flight: &mut HashMap<Id, N>,
    ) -> std::result::Result<usize, (N, RatsError)> {
        let registries = self.frame.registries();
        let capacity = self
            .concurrency
            .max_concurrent_nodes
            .max(1)
            .saturating_sub(tasks.len());
        let mut launched = 0;

        for node in registries
            .states
            .get_nodes_by_state(NodeState::Pending)
            .into_iter()
            .take(capacity)
        {
            let executable = match registries.executables.get(&node) {
                Ok(executable) => executable,
                Err(err) => {
                    self.frame.transition(&node, NodeState::Failed);
                    self.frame.record_failure(&node, &err);
                    return Err((node, err));
                }
            };

            self.frame.transition(&node, NodeState::Running);
            tracing::debug!(session_id = %self.id, node = node.key(), "Spawning node");

            let task_node = node.clone();
            let handle = tasks.spawn_blocking(move || {
                let result = run_executable(task_node.key(), executable.as_ref());
                (task_node, result)
            });
            in_flight.insert(handle.id(), node);
            launched += 1;
        }

        Ok(launched)
    }

    fn deadlock(&self, rounds: u64) -> RatsError {
        self.frame.registries().session_state.set(SessionState::Stopped);
        let nodes: Vec<String> = self
            .frame
            .unfinished_nodes()
            .iter()
            .map(|node| node.key().to_string())
            .collect();
        tracing::error!(session_id = %self.id, rounds, unfinished = ?nodes, "Session deadlocked");
        self.frame.emit(LogEvent::session(
            self.id,
            EventKind::Deadlocked {
                ticks: rounds,
                unfinished: nodes.clone(),
            },
        ));
        RatsError::Deadlock {
            session_id: self.id,
            ticks: rounds,
            nodes,
        }
    }
}

impl<N: PipelineNode> std::fmt::Debug for ConcurrentSession<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentSession")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}
