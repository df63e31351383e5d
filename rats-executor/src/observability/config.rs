//! Tracing configuration.

use std::env;
use std::io::IsTerminal;
use std::str::FromStr;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line output.
    #[default]
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// How the process-wide tracing subscriber is set up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive, e.g. `info` or `warn,rats_executor=debug`.
    pub filter: String,
    /// Include file and line.
    pub include_location: bool,
    /// Include the event target.
    pub include_target: bool,
    /// Include thread names.
    pub include_thread_names: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: "info".to_string(),
            include_location: false,
            include_target: true,
            include_thread_names: false,
        }
    }
}

impl TracingConfig {
    /// Create configuration from environment variables.
    ///
    /// - `RATS_LOG_FORMAT`: `json`, `pretty` or `compact`; when unset, `pretty`
    ///   on a terminal and `compact` otherwise
    /// - `RATS_LOG_LEVEL` or `RUST_LOG`: filter directive
    /// - `RATS_LOG_LOCATION`: `true`/`1` to include file and line
    /// - `RATS_LOG_THREAD_NAMES`: `true`/`1` to include thread names
    pub fn from_env() -> Self {
        let format = env::var("RATS_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse::<LogFormat>().ok())
            .unwrap_or_else(|| {
                if std::io::stdout().is_terminal() {
                    LogFormat::Pretty
                } else {
                    LogFormat::Compact
                }
            });

        let filter = env::var("RATS_LOG_LEVEL")
            .or_else(|_| env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string());

        Self {
            format,
            filter,
            include_location: env_flag("RATS_LOG_LOCATION"),
            include_target: true,
            include_thread_names: env_flag("RATS_LOG_THREAD_NAMES"),
        }
    }

    /// Set the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the filter directive.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Map a `-v` count onto the filter: 0 keeps the current filter,
    /// 1 is `debug`, 2 or more is `trace`.
    pub fn with_verbosity(self, verbose: u8) -> Self {
        match verbose {
            0 => self,
            1 => self.with_filter("debug"),
            _ => self.with_filter("trace"),
        }
    }

    /// Include file and line in every event.
    pub fn with_location(mut self, include: bool) -> Self {
        self.include_location = include;
        self
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|s| s.eq_ignore_ascii_case("true") || s == "1")
        .unwrap_or(false)
}
