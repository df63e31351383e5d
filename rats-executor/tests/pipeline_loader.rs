//! Integration tests for loading pipeline definitions from YAML files.

mod common;

use rats_core::error::RatsError;
use rats_core::io::{MemoryStore, PortKey};
use rats_core::settings::ConcurrentSettings;
use rats_core::types::NodeState;
use rats_executor::loader::{ExecutableCatalog, NoopExecutable, PipelineLoader};
use rats_executor::testing::ExecutionLog;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

use common::{node, test_log_collector};

fn write_yaml(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const ETL: &str = r#"
name: etl
description: Extract, transform, load
settings:
  failure_policy: continue
  deadlock_threshold: 3
nodes:
  - key: extract
    executable:
      kind: noop
  - key: transform
    depends_on: [extract]
    executable:
      kind: sleep
      config:
        ms: 1
  - key: audit
    depends_on: [extract]
  - key: load
    depends_on: [transform, audit]
"#;

#[test]
fn load_file_and_run() {
    let file = write_yaml(ETL);
    let mut session = PipelineLoader::new().load_file(file.path()).unwrap();

    assert_eq!(session.name(), Some("etl"));
    assert_eq!(session.settings().deadlock_threshold, 3);

    let report = session.run().unwrap();
    assert_eq!(report.executed, vec!["extract", "transform", "audit", "load"]);
    assert_eq!(session.node_state(&node("load")).unwrap(), NodeState::Completed);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = PipelineLoader::new()
        .load_file(dir.path().join("absent.yaml"))
        .unwrap_err();
    assert_eq!(err.code(), "E901");
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    let file = write_yaml("name: [unterminated\n");
    let err = PipelineLoader::new().load_file(file.path()).unwrap_err();
    assert!(matches!(err, RatsError::YamlParse { .. }));
}

#[test]
fn unknown_dependency_in_file_is_rejected() {
    let file = write_yaml("name: p\nnodes:\n  - key: a\n    depends_on: [ghost]\n");
    let err = PipelineLoader::new().load_file(file.path()).unwrap_err();
    assert_eq!(err.code(), "E401");
    assert!(err.to_string().contains("ghost"));
}

#[cfg(unix)]
#[test]
fn command_output_lands_in_shared_store() {
    let store = Arc::new(MemoryStore::new());
    let yaml = r#"
name: shell
nodes:
  - key: greet
    executable:
      kind: command
      config:
        program: echo
        args: [hello]
"#;
    let mut session = PipelineLoader::new()
        .with_store(store.clone())
        .load_str(yaml)
        .unwrap();
    session.run().unwrap();

    let output: String = store.load_as(&PortKey::out("greet")).unwrap();
    assert_eq!(output.trim(), "hello");
}

#[test]
fn custom_kinds_are_resolved_through_the_catalog() {
    let log = ExecutionLog::new();
    let mut catalog = ExecutableCatalog::with_builtins();
    let recorder = log.clone();
    catalog
        .register("record", move |ctx| Ok(recorder.executable(ctx.node)))
        .unwrap();
    catalog
        .register("quiet", |_| Ok(Arc::new(NoopExecutable)))
        .unwrap();

    let yaml = r#"
name: custom
nodes:
  - key: first
    executable:
      kind: record
  - key: second
    depends_on: [first]
    executable:
      kind: record
  - key: tail
    depends_on: [second]
    executable:
      kind: quiet
"#;
    let collector = test_log_collector();
    let mut session = PipelineLoader::new()
        .with_catalog(catalog)
        .with_log_collector(collector.clone())
        .load_str(yaml)
        .unwrap();
    session.run().unwrap();

    assert_eq!(log.keys(), vec!["first", "second"]);
    assert!(!collector.by_session(session.id()).is_empty());
}

#[test]
fn unknown_kind_is_a_config_error() {
    let yaml = "name: p\nnodes:\n  - key: a\n    executable:\n      kind: teleport\n";
    let err = PipelineLoader::new().load_str(yaml).unwrap_err();
    assert_eq!(err.code(), "E402");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn loaded_session_runs_concurrently() {
    let file = write_yaml(ETL);
    let session = PipelineLoader::new().load_file(file.path()).unwrap();
    let mut session = session.into_concurrent(ConcurrentSettings::default());

    let report = session.run().await.unwrap();
    assert!(report.is_success());
    assert_eq!(report.executed.len(), 4);
    assert_eq!(report.executed.last().map(String::as_str), Some("load"));
}
