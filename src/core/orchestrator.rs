// src/core/orchestrator.rs

//! # Orchestrator
//!
//! Drives one run across every selected profile:
//!
//! 1. Confirms each profile's identity and builds its resolved environment, in profile
//!    order. Nothing executes until every profile has passed.
//! 2. Runs the top-level commands breadth-first: command *i* (with its whole subtree)
//!    finishes for every profile before any profile starts command *i+1*.
//!
//! The first failure of any kind ends the run.

use crate::{
    core::{
        context_resolver::{self, ResolveError},
        query::JsonQuery,
        report::{Mode, NodeReport, RunReporter},
        task_executor::{NodeError, NodeExecutor, Target},
    },
    models::{Builtins, Environment, RunConfig},
    system::{
        executor::ProcessRunner,
        identity::{IdentityError, IdentityProvider},
    },
};
use thiserror::Error;

/// Errors that abort a whole run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("No profiles to run.")]
    NoProfiles,
    #[error("No cmd to run.")]
    NoCommands,
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error("profile {profile}: {source}")]
    Resolve {
        profile: String,
        #[source]
        source: ResolveError,
    },
    #[error(transparent)]
    Node(#[from] NodeError),
}

/// Everything a finished run produced.
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// One entry per node per profile, in execution order.
    pub reports: Vec<NodeReport>,
    /// Each profile's environment as it stood when the run ended, in profile order.
    pub environments: Vec<(String, Environment)>,
}

/// Drives the command list across every selected profile.
pub struct Orchestrator<'a> {
    identity: &'a mut dyn IdentityProvider,
    runner: &'a mut dyn ProcessRunner,
    query: &'a dyn JsonQuery,
    reporter: &'a mut dyn RunReporter,
}

impl std::fmt::Debug for Orchestrator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}

impl<'a> Orchestrator<'a> {
    /// Wires the orchestrator to its identity, process, query and report seams.
    pub fn new(
        identity: &'a mut dyn IdentityProvider,
        runner: &'a mut dyn ProcessRunner,
        query: &'a dyn JsonQuery,
        reporter: &'a mut dyn RunReporter,
    ) -> Self {
        Self {
            identity,
            runner,
            query,
            reporter,
        }
    }

    /// Runs `config` against `profiles`, stopping at the first failure.
    pub fn run(
        &mut self,
        config: &RunConfig,
        profiles: &[String],
        run_id: &str,
        mode: Mode,
    ) -> Result<RunOutcome, RunError> {
        if profiles.is_empty() {
            return Err(RunError::NoProfiles);
        }
        if config.cmd.is_empty() {
            return Err(RunError::NoCommands);
        }
        let region = config.region();

        // --- Phase 1: identity and environments ---
        let mut environments: Vec<(String, Environment)> = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let identity = match self.identity.caller_identity(profile, region) {
                Ok(identity) => identity,
                Err(e) => {
                    self.reporter.identity_rejected(profile, &e);
                    return Err(e.into());
                }
            };
            self.reporter.identity_confirmed(profile, &identity);

            let builtins = Builtins {
                profile: profile.clone(),
                region: region.to_string(),
                account_id: identity.account,
                run_id: Some(run_id.to_string()),
            };
            let env = context_resolver::build_environment(
                &builtins,
                &config.vars.defaults,
                config.profile_vars(profile),
            )
            .map_err(|source| RunError::Resolve {
                profile: profile.clone(),
                source,
            })?;
            log::debug!("environment for {}: {} variables", profile, env.len());
            environments.push((profile.clone(), env));
        }

        // --- Phase 2: breadth-first command gate ---
        // Planning works on copies: planned captures are markers, not real values.
        let mut planned;
        let working = match mode {
            Mode::Plan => {
                planned = environments.clone();
                &mut planned
            }
            Mode::Execute => &mut environments,
        };
        let mut reports = Vec::new();
        for command in &config.cmd {
            self.reporter.command_started(&command.name, mode);
            for (profile, env) in working.iter_mut() {
                let target = Target {
                    profile: profile.as_str(),
                    region,
                };
                let mut executor =
                    NodeExecutor::new(&mut *self.runner, self.query, &mut *self.reporter, mode);
                let result = executor.execute(command, target, env);
                reports.extend(executor.into_reports());
                result?;
            }
            self.reporter.command_finished(&command.name, mode);
        }

        log::info!(
            "run {} finished: {} node report(s) across {} profile(s)",
            run_id,
            reports.len(),
            environments.len()
        );
        Ok(RunOutcome {
            reports,
            environments,
        })
    }
}
