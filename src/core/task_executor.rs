// src/core/task_executor.rs

use crate::{
    constants::{TOOL_ENV_OVERRIDES, TOOL_PROGRAM, is_builtin_var},
    core::{
        capture::{self, CaptureError},
        interpolator::{self, InterpolationError},
        predicate::{self, PredicateError},
        query::JsonQuery,
        report::{Mode, NodeReport, NodeStatus, RunReporter, Stage},
    },
    models::{CommandNode, Environment},
    system::executor::{ExecutionError, ProcessRunner, display_command},
};
use serde_json::Value;
use thiserror::Error;

/// Why a node stopped.
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Interpolation(#[from] InterpolationError),
    #[error("unresolved variable remains in cmd arg: {0}")]
    Unresolved(String),
    #[error(transparent)]
    Spawn(#[from] ExecutionError),
    #[error("command exited with status {}", .0.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    ExitStatus(Option<i32>),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Predicate(#[from] PredicateError),
}

/// A failed node, located by profile, node name and stage.
#[derive(Error, Debug)]
#[error("profile {profile} cmd {node} ({stage}): {source}")]
pub struct NodeError {
    pub profile: String,
    pub node: String,
    pub stage: Stage,
    #[source]
    pub source: StageError,
}

/// Which profile and region a node is sent to.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub profile: &'a str,
    pub region: &'a str,
}

// --- Command Assembly ---

/// Renders the full argument vector for a node: the fixed targeting flags, followed by
/// every `run` entry expanded against `env`.
pub fn render_args(
    target: Target<'_>,
    run: &[String],
    env: &Environment,
) -> Result<Vec<String>, StageError> {
    let mut full: Vec<String> = [
        TOOL_PROGRAM,
        "--no-cli-pager",
        "--profile",
        target.profile,
        "--region",
        target.region,
        "--output",
        "json",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    for arg in run {
        let rendered = interpolator::expand_str(arg, env)?;
        // Captured values are inserted mid-run and never went through the closure pass.
        if interpolator::has_placeholder(&rendered) {
            return Err(StageError::Unresolved(rendered));
        }
        full.push(rendered);
    }
    Ok(full)
}

/// The stand-in value a planned run renders for a variable that would be captured.
pub fn planned_capture_marker(name: &str) -> String {
    format!("<captured:{name}>")
}

/// Declares, with a visible marker, every variable the subtree of `node` could capture,
/// so later planned nodes can still render. Built-in names stay untouched.
pub fn seed_planned_captures(node: &CommandNode, env: &mut Environment) {
    for var in node.capture.keys() {
        if !is_builtin_var(var) {
            env.insert(var.clone(), planned_capture_marker(var));
        }
    }
    for child in node.on_true.iter().chain(node.on_false.iter()) {
        seed_planned_captures(child, env);
    }
}

// --- Tree Executor ---

/// Walks a command tree for one profile at a time.
pub struct NodeExecutor<'a> {
    runner: &'a mut dyn ProcessRunner,
    query: &'a dyn JsonQuery,
    reporter: &'a mut dyn RunReporter,
    mode: Mode,
    reports: Vec<NodeReport>,
}

impl std::fmt::Debug for NodeExecutor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeExecutor")
            .field("mode", &self.mode)
            .field("reports", &self.reports.len())
            .finish_non_exhaustive()
    }
}

impl<'a> NodeExecutor<'a> {
    /// Creates an executor for `mode`.
    pub fn new(
        runner: &'a mut dyn ProcessRunner,
        query: &'a dyn JsonQuery,
        reporter: &'a mut dyn RunReporter,
        mode: Mode,
    ) -> Self {
        Self {
            runner,
            query,
            reporter,
            mode,
            reports: Vec::new(),
        }
    }

    /// Every report produced so far, in execution order.
    pub fn into_reports(self) -> Vec<NodeReport> {
        self.reports
    }

    /// Executes `node` (and, in execute mode, its selected subtree) for one profile.
    ///
    /// `env` is the profile's own environment; captures are written into it and stay
    /// visible to every later node of the same profile.
    pub fn execute(
        &mut self,
        node: &CommandNode,
        target: Target<'_>,
        env: &mut Environment,
    ) -> Result<(), NodeError> {
        self.execute_inner(node, target, env, 0)
    }

    fn execute_inner(
        &mut self,
        node: &CommandNode,
        target: Target<'_>,
        env: &mut Environment,
        depth: usize,
    ) -> Result<(), NodeError> {
        // RENDER
        let argv = match render_args(target, &node.run, env) {
            Ok(argv) => argv,
            Err(e) => return Err(self.fail(node, target, depth, Vec::new(), Stage::Render, e)),
        };

        if self.mode == Mode::Plan {
            log::trace!("planned '{}' for {}: {}", node.name, target.profile, display_command(&argv));
            self.finish(NodeReport {
                profile: target.profile.to_string(),
                node: node.name.clone(),
                depth,
                argv,
                status: NodeStatus::Planned,
                captured: Vec::new(),
                branch: None,
            });
            seed_planned_captures(node, env);
            return Ok(());
        }

        // RUN
        self.reporter.node_started(target.profile, &node.name, depth, &argv);
        let output = match self.runner.run(&argv, TOOL_ENV_OVERRIDES) {
            Ok(output) if output.success() => output,
            Ok(output) => {
                let e = StageError::ExitStatus(output.code);
                return Err(self.fail(node, target, depth, argv, Stage::Run, e));
            }
            Err(e) => return Err(self.fail(node, target, depth, argv, Stage::Run, e.into())),
        };

        // PARSE: non-JSON output is only a problem for nodes that need it.
        let last_json: Option<Value> = serde_json::from_slice(&output.stdout).ok();
        if last_json.is_none() {
            log::debug!("'{}' for {} produced no JSON output", node.name, target.profile);
        }

        // CAPTURE
        let captured = match capture::apply_captures(&node.capture, last_json.as_ref(), env, self.query) {
            Ok(captured) => captured,
            Err(e) => return Err(self.fail(node, target, depth, argv, Stage::Capture, e.into())),
        };

        // PREDICATE
        let passed = match predicate::evaluate(node.when.as_ref(), last_json.as_ref(), env, self.query) {
            Ok(passed) => passed,
            Err(e) => return Err(self.fail(node, target, depth, argv, Stage::Predicate, e.into())),
        };

        self.finish(NodeReport {
            profile: target.profile.to_string(),
            node: node.name.clone(),
            depth,
            argv,
            status: NodeStatus::Succeeded,
            captured,
            branch: node.when.as_ref().map(|_| passed),
        });

        // RECURSE
        let children = if passed { &node.on_true } else { &node.on_false };
        for child in children {
            self.execute_inner(child, target, env, depth + 1)?;
        }
        Ok(())
    }

    fn finish(&mut self, report: NodeReport) {
        self.reporter.node_finished(&report);
        self.reports.push(report);
    }

    fn fail(
        &mut self,
        node: &CommandNode,
        target: Target<'_>,
        depth: usize,
        argv: Vec<String>,
        stage: Stage,
        source: StageError,
    ) -> NodeError {
        log::debug!("'{}' for {} failed at {}: {}", node.name, target.profile, stage, source);
        self.finish(NodeReport {
            profile: target.profile.to_string(),
            node: node.name.clone(),
            depth,
            argv,
            status: NodeStatus::Failed(stage),
            captured: Vec::new(),
            branch: None,
        });
        NodeError {
            profile: target.profile.to_string(),
            node: node.name.clone(),
            stage,
            source,
        }
    }
}
