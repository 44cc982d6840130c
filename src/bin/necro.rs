// src/bin/necro.rs

use anyhow::{Result, anyhow};
use clap::Parser;
use colored::*;
use necro::cli::{Cli, handlers};

// --- Command Definition and Registry ---

/// Defines a system command, its aliases, and its handler function.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>) -> Result<()>,
}

/// Every system command. Anything else in first position is a config file.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "help",
        aliases: &["-h", "--help"],
        handler: handlers::help::handle,
    },
    CommandDefinition {
        name: "version",
        aliases: &["-V", "--version"],
        handler: handlers::version::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Sets up logging, dispatches, and performs centralized error handling.
fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let Some(first) = cli.args.first() else {
        handlers::help::print_usage();
        return Err(anyhow!("missing <config-file> argument"));
    };

    match find_command(first) {
        Some(command) => (command.handler)(cli.args.iter().skip(1).cloned().collect()),
        None => handlers::run::handle(cli.args),
    }
}
