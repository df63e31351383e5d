//! The executable contract.

use crate::error::BoxError;
use std::fmt;

/// Outcome of running an executable.
pub type ExecuteResult = std::result::Result<(), BoxError>;

/// A unit of work bound to a node.
///
/// Executables take no arguments and report failure only through the returned
/// error. Anything they need (data stores, clients, configuration) is captured
/// at construction time.
pub trait Executable: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str {
        "executable"
    }

    /// Run the unit of work to completion.
    fn execute(&self) -> ExecuteResult;
}

/// Executable backed by a closure.
pub struct FnExecutable<F> {
    name: String,
    f: F,
}

impl<F> FnExecutable<F>
where
    F: Fn() -> ExecuteResult + Send + Sync,
{
    /// Wrap a closure.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Executable for FnExecutable<F>
where
    F: Fn() -> ExecuteResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self) -> ExecuteResult {
        (self.f)()
    }
}

impl<F> fmt::Debug for FnExecutable<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExecutable")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Build an executable from a closure.
pub fn from_fn<F>(f: F) -> FnExecutable<F>
where
    F: Fn() -> ExecuteResult + Send + Sync,
{
    FnExecutable::new("fn", f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn closure_executable_runs() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let exe = FnExecutable::new("count", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        exe.execute().unwrap();
        exe.execute().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(exe.name(), "count");
    }

    #[test]
    fn closure_executable_reports_errors() {
        let exe = from_fn(|| Err("no input".into()));
        let err = exe.execute().unwrap_err();
        assert_eq!(err.to_string(), "no input");
    }
}
