#![allow(clippy::module_inception)]

//! Pipeline loading from YAML definitions.
//!
//! - [`ExecutableCatalog`] maps executable kinds to factories
//! - [`PipelineLoader`] turns a [`rats_core::flow::PipelineDefinition`] into a
//!   [`crate::session::Session`]
//!
//! Built-in kinds:
//!
//! | Kind | Config | Behaviour |
//! |------|--------|-----------|
//! | `noop` | | returns immediately |
//! | `sleep` | `ms` | blocks the calling thread |
//! | `command` | `program`, `args` | runs a process, stores its stdout under `<node>.out` |
//! | `fail` | `message` | returns an error |

mod builtins;
mod catalog;
mod loader;

pub use builtins::{
    BuiltinError, CommandExecutable, FailExecutable, NoopExecutable, SleepExecutable,
};
pub use catalog::{BuildContext, ExecutableCatalog, ExecutableFactory};
pub use loader::{LOG_COLLECTOR, LoaderConfig, PipelineLoader, STORE};
