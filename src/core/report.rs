// src/core/report.rs

use crate::system::identity::{CallerIdentity, IdentityError};
use std::fmt;

/// Whether a run renders commands only or actually executes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Plan,
    Execute,
}

/// The step of a command node at which something happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Render,
    Run,
    Capture,
    Predicate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Render => "render",
            Self::Run => "run",
            Self::Capture => "capture",
            Self::Predicate => "predicate",
        };
        f.write_str(name)
    }
}

/// Final state of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// Rendered only (planning mode).
    Planned,
    Succeeded,
    Failed(Stage),
}

/// The outcome of one node for one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReport {
    pub profile: String,
    pub node: String,
    /// 0 for top-level commands.
    pub depth: usize,
    /// The rendered argument vector; empty if rendering itself failed.
    pub argv: Vec<String>,
    pub status: NodeStatus,
    /// Variables written by this node's capture, in name order.
    pub captured: Vec<(String, String)>,
    /// Result of the branch predicate, if the node declares one.
    pub branch: Option<bool>,
}

/// Receives progress events from a run. Every method defaults to doing nothing.
pub trait RunReporter {
    fn identity_confirmed(&mut self, _profile: &str, _identity: &CallerIdentity) {}
    fn identity_rejected(&mut self, _profile: &str, _error: &IdentityError) {}
    fn command_started(&mut self, _name: &str, _mode: Mode) {}
    fn node_started(&mut self, _profile: &str, _node: &str, _depth: usize, _argv: &[String]) {}
    fn node_finished(&mut self, _report: &NodeReport) {}
    fn command_finished(&mut self, _name: &str, _mode: Mode) {}
}

/// A reporter that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl RunReporter for SilentReporter {}
