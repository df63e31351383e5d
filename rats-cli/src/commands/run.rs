//! Run command - load a pipeline and drive it to completion.

use anyhow::{Context, Result};
use rats_core::settings::ConcurrentSettings;
use rats_executor::loader::PipelineLoader;
use rats_executor::session::SessionReport;
use std::path::Path;

/// Run the run command.
pub async fn run(file: &str, concurrent: bool, max_concurrent: Option<usize>) -> Result<()> {
    let path = Path::new(file);
    if !path.exists() {
        anyhow::bail!("Pipeline file not found: {}", file);
    }

    let session = PipelineLoader::new()
        .load_file(path)
        .with_context(|| format!("Failed to load pipeline from {}", file))?;
    let name = session.name().unwrap_or("<unnamed>").to_string();

    tracing::info!(file = %file, pipeline = %name, concurrent, "Running pipeline");

    let result = if concurrent {
        let mut settings = ConcurrentSettings::from_env();
        if let Some(max) = max_concurrent {
            settings = settings.with_max_concurrent_nodes(max);
        }
        let mut session = session.into_concurrent(settings);
        session.run().await
    } else {
        let mut session = session;
        tokio::task::spawn_blocking(move || session.run())
            .await
            .context("Session task failed")?
    };
    let report = result.with_context(|| format!("Pipeline '{}' did not complete", name))?;

    print_report(&name, &report);

    if !report.is_success() {
        anyhow::bail!("{} node(s) failed", report.failed.len());
    }
    Ok(())
}

fn print_report(name: &str, report: &SessionReport) {
    println!("Pipeline:  {}", name);
    println!("Session:   {}", report.session_id);
    println!("Ticks:     {}", report.ticks);
    println!("Elapsed:   {:?}", report.elapsed);
    println!();

    println!("Completed ({}):", report.executed.len());
    for key in &report.executed {
        println!("  ✓ {}", key);
    }

    if !report.failed.is_empty() {
        println!();
        println!("Failed ({}):", report.failed.len());
        for key in &report.failed {
            println!("  ✗ {}", key);
        }
    }
}
