//! Core traits for rats components.
//!
//! - `Executable`: the unit of work bound to a node

mod executable;

pub use executable::{ExecuteResult, Executable, FnExecutable, from_fn};
