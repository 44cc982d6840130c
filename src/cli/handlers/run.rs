// src/cli/handlers/run.rs

use crate::{
    cli::transcript::TranscriptReporter,
    core::{
        config_loader, graph_display,
        orchestrator::{Orchestrator, RunError},
        paths, profiles,
        query::PathQuery,
        report::Mode,
    },
    system::{
        executor::StreamingRunner,
        identity::StsIdentity,
        run_log::{self, RunLog},
    },
};
use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::sync::Arc;

#[derive(Parser, Debug, Default)]
#[command(
    no_binary_name = true,
    about = "Runs every command of a config file across the selected profiles."
)]
struct RunArgs {
    /// Path to the YAML (or `.toml`) run configuration. `~` is expanded.
    config: String,

    /// Render the top-level commands for every profile without running anything.
    #[arg(long)]
    dry_run: bool,

    /// Skip the confirmation prompt.
    #[arg(long, short)]
    yes: bool,
}

/// Main entry point for a run: `necro <config-file> [--dry-run] [--yes]`.
pub fn handle(args: Vec<String>) -> Result<()> {
    let run_args = RunArgs::try_parse_from(&args).unwrap_or_else(|e| e.exit());
    let mode = if run_args.dry_run { Mode::Plan } else { Mode::Execute };

    // 1. Load and validate the configuration.
    let config_path = paths::expand_user_path(&run_args.config)?;
    let config = config_loader::load_config(&config_path)
        .with_context(|| format!("Could not load '{}'", run_args.config))?;

    // 2. Select targets. An empty selection is fatal before anything is written.
    let targets = profiles::select_profiles(&config.targets);
    if targets.is_empty() {
        return Err(RunError::NoProfiles.into());
    }

    // 3. Open the transcript.
    let run_id = run_log::new_run_id();
    let cwd = std::env::current_dir().context("Could not determine the working directory")?;
    let run_log = RunLog::create(&cwd, &run_id).context("Could not create the run log file")?;
    let mut reporter = TranscriptReporter::new(Arc::clone(&run_log.sink));

    // 4. Preview.
    reporter.line(&format!("🧾 LOG FILE | {}", run_log.path.display()));
    reporter.line(&format!("🆔 RUN ID   | {run_id}"));
    reporter.line("\n==== TARGET PROFILES ====");
    for profile in &targets {
        reporter.line(&format!("- {profile}"));
    }
    reporter.line("\n==== COMMANDS ====");
    for line in graph_display::render_command_tree(&config.cmd) {
        reporter.line(&line);
    }

    // 5. Gate. The prompt and the answer stay off the transcript.
    match mode {
        Mode::Plan => reporter.line("\n==== DRY RUN PLAN ===="),
        Mode::Execute if !run_args.yes => {
            println!();
            let proceed = Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt("Proceed?")
                .default(false)
                .interact()
                .context("Could not read the confirmation answer")?;
            if !proceed {
                reporter.line("Cancelled.");
                return Ok(());
            }
        }
        Mode::Execute => log::debug!("confirmation skipped by --yes"),
    }

    // 6. Run.
    let mut identity = StsIdentity;
    let mut runner = StreamingRunner::new(Arc::clone(&run_log.sink));
    let mut orchestrator = Orchestrator::new(&mut identity, &mut runner, &PathQuery, &mut reporter);
    let outcome = orchestrator.run(&config, &targets, &run_id, mode)?;

    log::debug!("{} node report(s) recorded", outcome.reports.len());
    if mode == Mode::Execute {
        println!(
            "\n{} {} command(s) across {} profile(s). Transcript: {}",
            "Done:".green().bold(),
            config.cmd.len(),
            targets.len(),
            run_log.path.display().to_string().cyan()
        );
    }
    Ok(())
}
