//! The frame controller.
//!
//! One [`Frame::tick`] performs, in order:
//!
//! 1. `REGISTERED -> QUEUED` for every node that was registered when the tick began
//! 2. admission of nodes added since the last tick (`-> REGISTERED`)
//! 3. `QUEUED -> PENDING` for every queued node whose prerequisites are all
//!    completed, and `QUEUED -> FAILED` for every queued node with a failed
//!    prerequisite
//! 4. execution of the first `PENDING` node (`PENDING -> RUNNING -> COMPLETED | FAILED`)
//! 5. the completion check, which stops the session once nothing is unfinished
//!
//! Admission runs after the promotion snapshot so a node added between ticks
//! stays `REGISTERED` for one full tick before it can be scheduled.

use crate::registry::Registries;
use rats_core::error::{RatsError, Result};
use rats_core::logging::{EventKind, LogCollector, LogEvent, NullCollector};
use rats_core::settings::FailurePolicy;
use rats_core::types::{Node, NodeState, PipelineNode, SessionId, SessionState};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;

/// Result of [`Frame::execute_next`].
#[derive(Debug)]
pub enum ExecutionOutcome<N: PipelineNode = Node> {
    /// No node was pending.
    Idle,
    /// The node ran and is now `COMPLETED`.
    Completed(N),
    /// The node ran, failed, and the failure policy allowed the tick to continue.
    Failed(N, RatsError),
}

/// Summary of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Nodes admitted as `REGISTERED`.
    pub admitted: usize,
    /// Nodes moved `REGISTERED -> QUEUED`.
    pub queued: usize,
    /// Nodes moved `QUEUED -> PENDING`.
    pub pending: usize,
    /// Key of the node that ran and completed.
    pub executed: Option<String>,
    /// Keys of nodes that became `FAILED` during this tick.
    pub failed: Vec<String>,
    /// Whether the completion check stopped the session.
    pub stopped: bool,
}

impl FrameReport {
    /// Whether any state changed during the tick.
    pub fn made_progress(&self) -> bool {
        self.admitted > 0
            || self.queued > 0
            || self.pending > 0
            || self.executed.is_some()
            || !self.failed.is_empty()
            || self.stopped
    }
}

/// Drives one session's registries through discrete ticks.
///
/// The frame owns the transition discipline; the registries only store data.
pub struct Frame<N: PipelineNode = Node> {
    session_id: SessionId,
    registries: Registries<N>,
    policy: FailurePolicy,
    log_collector: Arc<dyn LogCollector>,
    pipeline: Option<String>,
    ticks: u64,
}

impl<N: PipelineNode> Frame<N> {
    /// Create a frame over the given registries.
    pub fn new(session_id: SessionId, registries: Registries<N>, policy: FailurePolicy) -> Self {
        Self {
            session_id,
            registries,
            policy,
            log_collector: Arc::new(NullCollector),
            pipeline: None,
            ticks: 0,
        }
    }

    /// Report transitions to `collector`.
    pub fn with_log_collector(mut self, collector: Arc<dyn LogCollector>) -> Self {
        self.log_collector = collector;
        self
    }

    /// Tag events with a pipeline name.
    pub fn with_pipeline(mut self, name: impl Into<String>) -> Self {
        self.pipeline = Some(name.into());
        self
    }

    /// The session this frame belongs to.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// The registries this frame drives.
    pub fn registries(&self) -> &Registries<N> {
        &self.registries
    }

    /// The failure policy in effect.
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// The pipeline name, if any.
    pub fn pipeline(&self) -> Option<&str> {
        self.pipeline.as_deref()
    }

    /// Ticks performed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Perform one scheduling step.
    #[instrument(skip(self), fields(session_id = %self.session_id, tick = self.ticks + 1))]
    pub fn tick(&mut self) -> Result<FrameReport> {
        self.ticks += 1;
        let mut report = FrameReport {
            tick: self.ticks,
            ..FrameReport::default()
        };

        report.queued = self.promote_registered().len();
        report.admitted = self.admit_new_nodes().len();
        report.pending = self.promote_queued().len();
        report
            .failed
            .extend(self.fail_blocked().iter().map(|n| n.key().to_string()));

        match self.execute_next()? {
            ExecutionOutcome::Idle => {}
            ExecutionOutcome::Completed(node) => report.executed = Some(node.key().to_string()),
            ExecutionOutcome::Failed(node, _) => {
                // Dependents are failed on the next tick, once they are queued.
                report.failed.push(node.key().to_string());
            }
        }

        report.stopped = self.check_completion();

        tracing::trace!(
            queued = report.queued,
            admitted = report.admitted,
            pending = report.pending,
            executed = ?report.executed,
            failed = report.failed.len(),
            stopped = report.stopped,
            "Tick finished"
        );
        Ok(report)
    }

    /// Move every `REGISTERED` node to `QUEUED`.
    ///
    /// The set of registered nodes is captured before any state is written.
    pub fn promote_registered(&self) -> Vec<N> {
        let registered = self.registries.states.get_nodes_by_state(NodeState::Registered);
        for node in &registered {
            self.transition(node, NodeState::Queued);
        }
        registered
    }

    /// Give every node that has no state yet the `REGISTERED` state.
    pub fn admit_new_nodes(&self) -> Vec<N> {
        let admitted: Vec<N> = self
            .registries
            .nodes
            .get_nodes()
            .into_iter()
            .filter(|node| !self.registries.states.has_state(node))
            .collect();
        for node in &admitted {
            self.transition(node, NodeState::Registered);
        }
        admitted
    }

    /// Move every `QUEUED` node whose prerequisites are all completed to `PENDING`.
    pub fn promote_queued(&self) -> Vec<N> {
        let queued = self.registries.states.get_nodes_by_state(NodeState::Queued);
        if queued.is_empty() {
            return queued;
        }

        let completed: HashSet<N> = self
            .registries
            .states
            .get_nodes_by_state(NodeState::Completed)
            .into_iter()
            .collect();
        let runnable = self
            .registries
            .dependencies
            .get_nodes_with_satisfied_dependencies(&queued, &completed);

        let promoted: Vec<N> = queued
            .into_iter()
            .filter(|node| runnable.contains(node))
            .collect();
        for node in &promoted {
            self.transition(node, NodeState::Pending);
        }
        promoted
    }

    /// Move every `QUEUED` node that depends, directly or transitively, on a
    /// `FAILED` node to `FAILED`.
    pub fn fail_blocked(&self) -> Vec<N> {
        let mut blocked = Vec::new();
        loop {
            let failed: HashSet<N> = self
                .registries
                .states
                .get_nodes_by_state(NodeState::Failed)
                .into_iter()
                .collect();
            if failed.is_empty() {
                return blocked;
            }

            let newly: Vec<N> = self
                .registries
                .states
                .get_nodes_by_state(NodeState::Queued)
                .into_iter()
                .filter(|node| {
                    !self
                        .registries
                        .dependencies
                        .get_dependencies(node)
                        .is_disjoint(&failed)
                })
                .collect();
            if newly.is_empty() {
                return blocked;
            }

            for node in &newly {
                tracing::warn!(
                    session_id = %self.session_id,
                    node = node.key(),
                    "Node skipped after upstream failure"
                );
                self.transition(node, NodeState::Failed);
            }
            blocked.extend(newly);
        }
    }

    /// Run the first `PENDING` node on the calling thread.
    ///
    /// A missing executable is always returned as an error. Other failures are
    /// returned under [`FailurePolicy::Propagate`] and reported as
    /// [`ExecutionOutcome::Failed`] under [`FailurePolicy::Continue`]. The node
    /// is `FAILED` in every failure case.
    pub fn execute_next(&self) -> Result<ExecutionOutcome<N>> {
        let Some(node) = self
            .registries
            .states
            .get_nodes_by_state(NodeState::Pending)
            .into_iter()
            .next()
        else {
            return Ok(ExecutionOutcome::Idle);
        };

        self.transition(&node, NodeState::Running);
        tracing::debug!(session_id = %self.session_id, node = node.key(), "Executing node");

        match self.registries.executables.execute(&node) {
            Ok(()) => {
                self.transition(&node, NodeState::Completed);
                Ok(ExecutionOutcome::Completed(node))
            }
            Err(err) => {
                self.transition(&node, NodeState::Failed);
                self.record_failure(&node, &err);
                if self.is_fatal(&err) {
                    Err(err)
                } else {
                    Ok(ExecutionOutcome::Failed(node, err))
                }
            }
        }
    }

    /// Stop the session if no node is unfinished.
    ///
    /// Nodes added to the registry but not yet admitted count as unfinished.
    pub fn check_completion(&self) -> bool {
        let unfinished = self.unfinished_nodes();
        if !unfinished.is_empty() {
            return false;
        }

        let previous = self.registries.session_state.set(SessionState::Stopped);
        if previous != SessionState::Stopped {
            tracing::info!(session_id = %self.session_id, "All nodes finished, session stopped");
            self.emit(LogEvent::session(self.session_id, EventKind::SessionCompleted));
        }
        true
    }

    /// Nodes that have not reached a terminal state, including nodes not yet admitted.
    pub fn unfinished_nodes(&self) -> Vec<N> {
        let mut unfinished = self.registries.states.get_nodes_in(&NodeState::UNFINISHED);
        unfinished.extend(
            self.registries
                .nodes
                .get_nodes()
                .into_iter()
                .filter(|node| !self.registries.states.has_state(node)),
        );
        unfinished
    }

    /// Whether `err` must end the run under the current policy.
    pub(crate) fn is_fatal(&self, err: &RatsError) -> bool {
        matches!(err, RatsError::ExecutableNotFound { .. })
            || self.policy == FailurePolicy::Propagate
    }

    /// Write a state and report the transition.
    pub(crate) fn transition(&self, node: &N, state: NodeState) {
        let previous = self.registries.states.set_node_state(node, state);

        tracing::debug!(
            session_id = %self.session_id,
            node = node.key(),
            from = previous.map_or("none", NodeState::as_str),
            to = state.as_str(),
            "Node state changed"
        );
        self.emit(LogEvent::node(
            self.session_id,
            node.key(),
            EventKind::Transition {
                from: previous,
                to: state,
            },
        ));
    }

    /// Log a node failure to both sinks.
    pub(crate) fn record_failure(&self, node: &N, err: &RatsError) {
        tracing::error!(
            session_id = %self.session_id,
            node = node.key(),
            code = err.code(),
            error = %err,
            "Node failed"
        );
        self.emit(LogEvent::node(
            self.session_id,
            node.key(),
            EventKind::NodeFailed {
                code: err.code().to_string(),
                error: err.to_string(),
            },
        ));
    }

    pub(crate) fn emit(&self, event: LogEvent) {
        let event = match &self.pipeline {
            Some(name) => event.with_pipeline(name.as_str()),
            None => event,
        };
        self.log_collector.collect(event);
    }
}

impl<N: PipelineNode> std::fmt::Debug for Frame<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("session_id", &self.session_id)
            .field("policy", &self.policy)
            .field("pipeline", &self.pipeline)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}
