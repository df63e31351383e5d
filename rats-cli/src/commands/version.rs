//! Version command - show version information.

use anyhow::Result;

/// Version information.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the version command.
pub fn run() -> Result<()> {
    println!("rats - tick-based pipeline runner");
    println!();
    println!("Version:     {}", VERSION);
    println!(
        "Platform:    {} / {}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    println!();
    println!("Components:");
    println!("  rats-core      Node types, errors, settings, YAML definitions");
    println!("  rats-executor  Registries, frame controller, sessions, loader");
    println!("  rats-cli       Command-line interface");

    Ok(())
}
