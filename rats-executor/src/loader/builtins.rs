//! Built-in executable kinds.

use rats_core::io::{DataStore, PortKey};
use rats_core::traits::{Executable, ExecuteResult};
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Failures reported by the built-in executables.
#[derive(Debug, Error)]
pub enum BuiltinError {
    /// The process could not be started.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        /// Program that was run.
        program: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The process exited unsuccessfully.
    #[error("'{program}' exited with {status}: {stderr}")]
    CommandFailed {
        /// Program that was run.
        program: String,
        /// Exit status as reported by the OS.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// A `fail` executable ran.
    #[error("{0}")]
    Requested(String),
}

/// Does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopExecutable;

impl Executable for NoopExecutable {
    fn name(&self) -> &str {
        "noop"
    }

    fn execute(&self) -> ExecuteResult {
        Ok(())
    }
}

/// Blocks the calling thread for a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct SleepExecutable {
    duration: Duration,
}

impl SleepExecutable {
    /// Sleep for `duration`.
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl Executable for SleepExecutable {
    fn name(&self) -> &str {
        "sleep"
    }

    fn execute(&self) -> ExecuteResult {
        std::thread::sleep(self.duration);
        Ok(())
    }
}

/// Runs an external program and stores its standard output.
pub struct CommandExecutable {
    program: String,
    args: Vec<String>,
    output: PortKey,
    store: Arc<dyn DataStore>,
}

impl CommandExecutable {
    /// Run `program` with `args`; stdout is saved under `output` in `store`.
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        output: PortKey,
        store: Arc<dyn DataStore>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            output,
            store,
        }
    }
}

impl Executable for CommandExecutable {
    fn name(&self) -> &str {
        "command"
    }

    fn execute(&self) -> ExecuteResult {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|source| BuiltinError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(BuiltinError::CommandFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        self.store
            .save(self.output.clone(), serde_json::Value::String(stdout))?;
        Ok(())
    }
}

impl std::fmt::Debug for CommandExecutable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutable")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

/// Always fails with a fixed message.
#[derive(Debug, Clone)]
pub struct FailExecutable {
    message: String,
}

impl FailExecutable {
    /// Fail with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Executable for FailExecutable {
    fn name(&self) -> &str {
        "fail"
    }

    fn execute(&self) -> ExecuteResult {
        Err(BuiltinError::Requested(self.message.clone()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rats_core::io::MemoryStore;

    #[test]
    fn fail_reports_message() {
        let err = FailExecutable::new("nope").execute().unwrap_err();
        assert_eq!(err.to_string(), "nope");
        assert!(err.downcast_ref::<BuiltinError>().is_some());
    }

    #[test]
    fn sleep_blocks_for_duration() {
        let started = std::time::Instant::now();
        SleepExecutable::new(Duration::from_millis(10)).execute().unwrap();
        assert!(started.elapsed() >= Duration::from_millis(10));
    }

    #[cfg(unix)]
    #[test]
    fn command_stores_stdout() {
        let store = Arc::new(MemoryStore::new());
        let command = CommandExecutable::new(
            "echo",
            vec!["hello".to_string()],
            PortKey::out("greet"),
            store.clone(),
        );
        command.execute().unwrap();

        let value: String = store.load_as(&PortKey::out("greet")).unwrap();
        assert_eq!(value.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn command_failure_is_reported() {
        let store = Arc::new(MemoryStore::new());
        let command =
            CommandExecutable::new("false", Vec::new(), PortKey::out("x"), store.clone());
        let err = command.execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuiltinError>(),
            Some(BuiltinError::CommandFailed { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn missing_program_cannot_spawn() {
        let command = CommandExecutable::new(
            "/nonexistent/rats-test-binary",
            Vec::new(),
            PortKey::out("x"),
            Arc::new(MemoryStore::new()),
        );
        let err = command.execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuiltinError>(),
            Some(BuiltinError::Spawn { .. })
        ));
    }
}
