//! Tracing setup for binaries embedding the scheduler.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the embedding process. [`init_tracing`] installs one configured from
//! [`TracingConfig`].
//!
//! # Configuration
//!
//! Output format is controlled via `RATS_LOG_FORMAT`:
//! - `json` - one JSON object per line
//! - `pretty` - multi-line, human-readable
//! - `compact` - single-line (default when stdout is not a terminal)
//!
//! The filter comes from `RATS_LOG_LEVEL`, then `RUST_LOG`, then `info`.
//!
//! ```ignore
//! use rats_executor::observability::{TracingConfig, init_tracing};
//!
//! let _guard = init_tracing(TracingConfig::from_env())?;
//! ```

mod config;
mod tracing_setup;

pub use config::{LogFormat, TracingConfig};
pub use tracing_setup::{TracingGuard, init_tracing};
