// src/cli/handlers/help.rs

use crate::cli::handlers::version;
use anyhow::Result;
use colored::Colorize;

/// Prints the version banner followed by usage.
pub fn print_usage() {
    println!("{}", version::version_line());
    println!();
    println!("{}", "Usage:".yellow().bold());
    println!("  {}", "necro version".cyan());
    println!("  {}", "necro <config-file> [--dry-run] [--yes]".cyan());
    println!();
    println!("{}", "Options:".yellow().bold());
    println!("  {}  render every top-level command per profile, run nothing", "--dry-run".green());
    println!("  {}  skip the confirmation prompt", "-y, --yes".green());
}

/// Prints the usage text.
pub fn handle(_args: Vec<String>) -> Result<()> {
    print_usage();
    Ok(())
}
