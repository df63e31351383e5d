//! rats CLI - run and inspect YAML pipeline definitions.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rats_executor::observability::{TracingConfig, TracingGuard, init_tracing};

/// rats - tick-based pipeline runner.
#[derive(Parser)]
#[command(name = "rats")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline from a YAML file
    Run {
        /// Path to the pipeline YAML file
        #[arg(short, long)]
        file: String,

        /// Run ready nodes concurrently on blocking tasks
        #[arg(long)]
        concurrent: bool,

        /// Maximum nodes in flight with --concurrent (defaults to RATS_MAX_CONCURRENT_NODES or 4)
        #[arg(long, requires = "concurrent")]
        max_concurrent: Option<usize>,
    },

    /// Validate a pipeline YAML file
    Validate {
        /// Path to the pipeline YAML file
        file: String,
    },

    /// Print the order nodes would execute in
    Plan {
        /// Path to the pipeline YAML file
        file: String,
    },

    /// Show version information
    Version,
}

fn setup_logging(verbosity: u8) -> Result<TracingGuard> {
    let mut config = TracingConfig::from_env();
    if verbosity == 0 && std::env::var_os("RATS_LOG_LEVEL").is_none() {
        config = config.with_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()),
        );
    }
    init_tracing(config.with_verbosity(verbosity))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _tracing_guard = setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Run {
            file,
            concurrent,
            max_concurrent,
        } => commands::run::run(&file, concurrent, max_concurrent).await,
        Commands::Validate { file } => commands::validate::run(&file),
        Commands::Plan { file } => commands::plan::run(&file),
        Commands::Version => commands::version::run(),
    }
}
