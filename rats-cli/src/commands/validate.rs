//! Validate command - validate a pipeline YAML file.

use anyhow::Result;
use rats_core::error::RatsError;
use rats_core::flow::PipelineDefinition;
use rats_executor::loader::{LoaderConfig, PipelineLoader};
use std::path::Path;

/// Run the validate command.
pub fn run(file: &str) -> Result<()> {
    let path = Path::new(file);

    if !path.exists() {
        anyhow::bail!("Pipeline file not found: {}", file);
    }

    tracing::info!(file = %file, "Validating pipeline");

    println!("Validation Results for: {}", file);
    println!("========================{}", "=".repeat(file.len()));
    println!();

    let definition = match PipelineDefinition::from_file(path) {
        Ok(def) => def,
        Err(e) => {
            println!("✗ YAML PARSE ERROR:");
            println!("  {}", e);
            anyhow::bail!("YAML parsing failed");
        }
    };

    println!("✓ YAML syntax is valid");
    println!();

    let mut has_errors = false;
    let mut has_warnings = false;

    match definition.validate() {
        Ok(()) => println!("✓ Structure validation passed"),
        Err(issues) => {
            has_errors = true;
            println!("✗ Structure validation failed:");
            for issue in &issues {
                println!("  - {}", issue);
            }
        }
    }
    println!();

    if !has_errors {
        // Structure was checked above; building covers cycles and executable config.
        let loader = PipelineLoader::new().with_config(LoaderConfig {
            skip_validation: true,
            ..LoaderConfig::default()
        });

        match loader.load(&definition) {
            Ok(session) => {
                println!("✓ Pipeline construction passed");
                println!();

                println!("Pipeline Summary:");
                println!("  Name: {}", definition.name);
                if let Some(description) = &definition.description {
                    println!("  Description: {}", description);
                }
                println!("  Nodes: {}", definition.nodes.len());
                println!(
                    "  Dependencies: {}",
                    definition
                        .nodes
                        .iter()
                        .map(|n| n.depends_on.len())
                        .sum::<usize>()
                );
                println!("  Failure policy: {}", definition.settings.failure_policy);

                if definition.nodes.is_empty() {
                    has_warnings = true;
                    println!();
                    println!("⚠ WARNING: Pipeline has no nodes");
                }

                match session.execution_plan() {
                    Ok(order) => {
                        println!();
                        println!("✓ Topological sort passed ({} nodes)", order.len());
                    }
                    Err(e) => {
                        has_errors = true;
                        println!();
                        println!("✗ Topological sort failed: {}", e);
                    }
                }
            }
            Err(e @ RatsError::ConfigValue { .. }) => {
                has_errors = true;
                println!("✗ Executable configuration failed:");
                println!("  {}", e);
            }
            Err(e) => {
                has_errors = true;
                println!("✗ Pipeline construction failed:");
                println!("  {}", e);
            }
        }
    }

    println!();
    println!("========================{}", "=".repeat(file.len()));

    if has_errors {
        println!("✗ Validation FAILED");
        anyhow::bail!("Pipeline validation failed");
    } else if has_warnings {
        println!("⚠ Validation passed with warnings");
    } else {
        println!("✓ Validation PASSED");
    }

    Ok(())
}
