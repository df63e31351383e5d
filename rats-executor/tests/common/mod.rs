//! Common test utilities for integration tests.

#![allow(dead_code)]

use rats_core::logging::BufferedCollector;
use rats_core::settings::SessionSettings;
use rats_core::traits::{Executable, from_fn};
use rats_core::types::Node;
use rats_executor::session::{PipelineBuilder, Session};
use rats_executor::testing::ExecutionLog;
use std::sync::Arc;

/// Shorthand for `Node::new`.
pub fn node(key: &str) -> Node {
    Node::new(key)
}

/// An executable that succeeds immediately.
pub fn noop() -> Arc<dyn Executable> {
    Arc::new(from_fn(|| Ok(())))
}

/// An executable that fails with `message`.
pub fn failing(message: &'static str) -> Arc<dyn Executable> {
    Arc::new(from_fn(move || Err(message.into())))
}

/// Create a log collector for testing.
pub fn test_log_collector() -> Arc<BufferedCollector> {
    Arc::new(BufferedCollector::with_default_capacity())
}

/// Build a session from `(key, dependencies)` pairs where every node records
/// itself in `log`. The log observes the session's state registry.
pub fn build_recorded(
    edges: &[(&str, &[&str])],
    settings: SessionSettings,
    log: &ExecutionLog,
) -> Session {
    let mut builder = PipelineBuilder::new().with_settings(settings);
    for (key, _) in edges {
        builder = builder.add_node(node(key)).unwrap();
    }
    for (key, deps) in edges {
        if !deps.is_empty() {
            builder = builder
                .add_dependencies(&node(key), deps.iter().map(|d| node(d)))
                .unwrap();
        }
        builder = builder
            .set_executable(&node(key), log.executable(*key))
            .unwrap();
    }
    let session = builder.build().unwrap();
    log.observe(Arc::clone(&session.registries().states));
    session
}

/// The chain `n0 -> n1 -> ... -> n{count-1}`, every node recorded in `log`.
pub fn build_chain(count: usize, settings: SessionSettings, log: &ExecutionLog) -> Session {
    let mut builder = PipelineBuilder::new().with_settings(settings);
    for i in 0..count {
        let key = format!("n{i}");
        builder = builder.add_node(node(&key)).unwrap();
        if i > 0 {
            builder = builder
                .add_dependency(&node(&key), &node(&format!("n{}", i - 1)))
                .unwrap();
        }
        builder = builder
            .set_executable(&node(&key), log.executable(key.clone()))
            .unwrap();
    }
    let session = builder.build().unwrap();
    log.observe(Arc::clone(&session.registries().states));
    session
}

/// The diamond `a -> {b, c} -> d`.
pub const DIAMOND: &[(&str, &[&str])] = &[
    ("a", &[]),
    ("b", &["a"]),
    ("c", &["a"]),
    ("d", &["b", "c"]),
];
