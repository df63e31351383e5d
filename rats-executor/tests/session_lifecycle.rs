//! Integration tests for session runs.
//!
//! End-to-end scenarios over small graphs, stopping, and nodes added while a
//! session is running.

mod common;

use rats_core::logging::{EventKind, LogCategory};
use rats_core::settings::SessionSettings;
use rats_core::types::{NodeState, SessionState};
use rats_executor::registry::Registries;
use rats_executor::session::{PipelineBuilder, Session};
use rats_executor::testing::ExecutionLog;
use std::sync::Arc;

use common::{DIAMOND, build_recorded, node, noop, test_log_collector};

#[test]
fn independent_nodes_both_complete() {
    let log = ExecutionLog::new();
    let mut session = build_recorded(&[("a", &[]), ("b", &[])], SessionSettings::default(), &log);
    let report = session.run().unwrap();

    assert_eq!(report.state, SessionState::Stopped);
    assert!(report.is_success());
    let mut keys = log.keys();
    keys.sort();
    assert_eq!(keys, vec!["a", "b"]);
    for key in ["a", "b"] {
        assert_eq!(session.node_state(&node(key)).unwrap(), NodeState::Completed);
    }
}

#[test]
fn dependent_waits_in_queue_until_prerequisite_completes() {
    let log = ExecutionLog::new();
    let mut session = build_recorded(&[("a", &[]), ("b", &["a"])], SessionSettings::default(), &log);

    let first = session.tick().unwrap();
    assert_eq!(first.executed.as_deref(), Some("a"));
    assert_eq!(session.node_state(&node("a")).unwrap(), NodeState::Completed);
    assert_eq!(session.node_state(&node("b")).unwrap(), NodeState::Queued);

    let second = session.tick().unwrap();
    assert_eq!(second.executed.as_deref(), Some("b"));
    assert!(second.stopped);

    let record = &log.records()[1];
    assert_eq!(record.key, "b");
    assert!(record.states.contains(&(node("a"), NodeState::Completed)));
}

#[test]
fn registering_dependencies_twice_is_rejected() {
    let registries: Registries = Registries::new();
    registries.nodes.register(node("a")).unwrap();
    registries.nodes.register(node("b")).unwrap();
    registries
        .dependencies
        .register_dependencies(&node("b"), [node("a")])
        .unwrap();

    let err = registries
        .dependencies
        .register_dependencies(&node("b"), [node("a")])
        .unwrap_err();
    assert_eq!(err.code(), "E103");
}

#[test]
fn missing_executable_fails_when_executed() {
    let mut session = PipelineBuilder::new()
        .add_node(node("a"))
        .unwrap()
        .build()
        .unwrap();

    let err = session.run().unwrap_err();
    assert_eq!(err.code(), "E106");
    assert_eq!(session.node_state(&node("a")).unwrap(), NodeState::Failed);
    assert_eq!(session.state(), SessionState::Stopped);
}

#[test]
fn diamond_sink_runs_after_both_branches() {
    let log = ExecutionLog::new();
    let mut session = build_recorded(DIAMOND, SessionSettings::default(), &log);
    let report = session.run().unwrap();

    assert_eq!(report.executed.len(), 4);
    let d = log.position("d").unwrap();
    assert!(log.position("b").unwrap() < d);
    assert!(log.position("c").unwrap() < d);

    let record = &log.records()[d];
    assert!(record.states.contains(&(node("b"), NodeState::Completed)));
    assert!(record.states.contains(&(node("c"), NodeState::Completed)));
}

#[test]
fn stop_halts_between_ticks_and_run_resumes() {
    let log = ExecutionLog::new();
    let mut session = build_recorded(DIAMOND, SessionSettings::default(), &log);

    let handle = session.handle();
    session.tick().unwrap();
    handle.stop();
    assert!(!handle.is_running());

    let report = session.run().unwrap();
    assert_eq!(report.state, SessionState::Stopped);
    assert_eq!(report.executed.len(), 3);
    assert_eq!(log.keys().len(), 4);
}

#[test]
fn node_added_mid_run_is_admitted_next_tick() {
    let log = ExecutionLog::new();
    let registries: Registries = Registries::new();
    let mut session = Session::new(registries, SessionSettings::default());
    let handle = session.handle();

    let late_log = log.clone();
    let adder = log.recording("first", move || {
        handle.add_node(node("late"), [node("first")], late_log.executable("late"))?;
        Ok(())
    });
    session.add_node(node("first"), [], adder).unwrap();
    log.observe(Arc::clone(&session.registries().states));

    let report = session.run().unwrap();
    assert_eq!(report.executed, vec!["first", "late"]);
    assert_eq!(log.keys(), vec!["first", "late"]);
    assert_eq!(session.node_state(&node("late")).unwrap(), NodeState::Completed);
}

#[test]
fn add_node_rejects_duplicates_and_unknown_prerequisites() {
    let session: Session = Session::new(Registries::new(), SessionSettings::default());
    session.add_node(node("a"), [], noop()).unwrap();

    assert_eq!(
        session.add_node(node("a"), [], noop()).unwrap_err().code(),
        "E101"
    );
    assert_eq!(
        session
            .add_node(node("b"), [node("ghost")], noop())
            .unwrap_err()
            .code(),
        "E104"
    );
    assert_eq!(session.registries().nodes.len(), 1);
    assert!(!session.registries().executables.contains(&node("b")));
}

#[test]
fn transitions_are_reported_to_the_collector() {
    let collector = test_log_collector();
    let mut session = PipelineBuilder::new()
        .name("reported")
        .with_log_collector(collector.clone())
        .add_node(node("a"))
        .unwrap()
        .set_executable(&node("a"), noop())
        .unwrap()
        .build()
        .unwrap();
    session.run().unwrap();

    assert_eq!(
        collector.transitions(session.id(), "a"),
        vec![
            NodeState::Queued,
            NodeState::Pending,
            NodeState::Running,
            NodeState::Completed,
        ]
    );
    let first = &collector.by_node(session.id(), "a")[0];
    assert_eq!(
        first.kind,
        EventKind::Transition {
            from: Some(NodeState::Registered),
            to: NodeState::Queued,
        }
    );

    let session_events: Vec<EventKind> = collector
        .by_category(LogCategory::Session)
        .into_iter()
        .map(|e| e.kind)
        .collect();
    assert_eq!(
        session_events,
        vec![EventKind::SessionStarted, EventKind::SessionCompleted]
    );
    assert!(collector.all().iter().all(|e| e.pipeline.as_deref() == Some("reported")));
}

#[test]
fn execution_plan_follows_dependencies() {
    let log = ExecutionLog::new();
    let session = build_recorded(
        &[("load", &["transform"]), ("transform", &["extract"]), ("extract", &[])],
        SessionSettings::default(),
        &log,
    );
    let plan: Vec<String> = session
        .execution_plan()
        .unwrap()
        .iter()
        .map(|n| n.key().to_string())
        .collect();
    assert_eq!(plan, vec!["extract", "transform", "load"]);
}
