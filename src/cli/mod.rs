// src/cli/mod.rs

use clap::Parser;

pub mod handlers;
pub mod transcript;

/// necro: runs one declarative AWS CLI workflow across many profiles.
///
/// Valid formats:
/// - `necro <config-file> [--dry-run] [--yes]`
/// - `necro version`
/// - `necro help`
#[derive(Parser, Debug)]
#[command(author, about, long_about = None)]
#[command(disable_help_subcommand = true, disable_help_flag = true)]
pub struct Cli {
    /// All arguments, routed by the first one: a system command name, or a config file.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
