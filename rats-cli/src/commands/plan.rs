//! Plan command - print the execution order of a pipeline.

use anyhow::{Context, Result};
use rats_executor::loader::PipelineLoader;

/// Run the plan command.
pub fn run(file: &str) -> Result<()> {
    let session = PipelineLoader::new()
        .load_file(file)
        .with_context(|| format!("Failed to load pipeline from {}", file))?;
    let order = session.execution_plan()?;
    let dependencies = &session.registries().dependencies;

    println!(
        "Execution plan for '{}' ({} nodes):",
        session.name().unwrap_or("<unnamed>"),
        order.len()
    );
    for (step, node) in order.iter().enumerate() {
        let mut deps: Vec<String> = dependencies
            .get_dependencies(node)
            .iter()
            .map(|dep| dep.key().to_string())
            .collect();
        deps.sort();

        if deps.is_empty() {
            println!("  {:>3}. {}", step + 1, node);
        } else {
            println!("  {:>3}. {}  (after {})", step + 1, node, deps.join(", "));
        }
    }

    Ok(())
}
