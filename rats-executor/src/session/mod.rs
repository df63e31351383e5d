//! Sessions: the run loop around a [`crate::scheduler::Frame`].
//!
//! - [`Session`] ticks its frame on the calling thread until it stops
//! - [`ConcurrentSession`] runs every pending node on a tokio blocking task and
//!   only marks a node completed once its task has been joined
//! - [`PipelineBuilder`] wires registries together and validates the graph

mod builder;
mod concurrent;
mod handle;
mod runner;

pub use builder::PipelineBuilder;
pub use concurrent::ConcurrentSession;
pub use handle::SessionHandle;
pub use runner::{Session, SessionReport};
