// src/test_support.rs

//! Scripted stand-ins for the process runner, the identity check and the reporter.

use crate::{
    core::report::{Mode, NodeReport, RunReporter},
    system::{
        executor::{ExecutionError, ProcessOutput, ProcessRunner},
        identity::{CallerIdentity, IdentityError, IdentityProvider},
    },
};
use std::collections::BTreeMap;

struct Response {
    needle: String,
    profile: Option<String>,
    code: i32,
    stdout: String,
}

/// Answers each call with the first scripted response whose needle appears in the argv.
/// Unmatched calls succeed with `{}`.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    responses: Vec<Response>,
    pub(crate) calls: Vec<Vec<String>>,
}

impl ScriptedRunner {
    pub(crate) fn respond(mut self, needle: &str, code: i32, stdout: &str) -> Self {
        self.responses.push(Response {
            needle: needle.to_string(),
            profile: None,
            code,
            stdout: stdout.to_string(),
        });
        self
    }

    /// Like [`respond`](Self::respond), but only for calls made with `--profile <profile>`.
    pub(crate) fn respond_for(mut self, profile: &str, needle: &str, code: i32, stdout: &str) -> Self {
        self.responses.push(Response {
            needle: needle.to_string(),
            profile: Some(profile.to_string()),
            code,
            stdout: stdout.to_string(),
        });
        self
    }

    pub(crate) fn was_called_with(&self, needle: &str) -> bool {
        self.calls.iter().any(|argv| argv.iter().any(|a| a == needle))
    }

    /// The profile and last argument of every call, in order.
    pub(crate) fn trace(&self) -> Vec<(String, String)> {
        self.calls
            .iter()
            .map(|argv| {
                (
                    profile_of(argv).unwrap_or_default().to_string(),
                    argv.last().cloned().unwrap_or_default(),
                )
            })
            .collect()
    }
}

fn profile_of(argv: &[String]) -> Option<&str> {
    argv.iter()
        .position(|a| a == "--profile")
        .and_then(|i| argv.get(i + 1))
        .map(String::as_str)
}

impl ProcessRunner for ScriptedRunner {
    fn run(
        &mut self,
        argv: &[String],
        env_overrides: &[(&str, &str)],
    ) -> Result<ProcessOutput, ExecutionError> {
        assert!(env_overrides.contains(&("AWS_PAGER", "")));
        self.calls.push(argv.to_vec());
        let profile = profile_of(argv);
        let hit = self.responses.iter().find(|r| {
            argv.iter().any(|a| *a == r.needle)
                && r.profile.as_deref().is_none_or(|p| Some(p) == profile)
        });
        Ok(match hit {
            Some(r) => ProcessOutput {
                code: Some(r.code),
                stdout: r.stdout.clone().into_bytes(),
            },
            None => ProcessOutput {
                code: Some(0),
                stdout: b"{}".to_vec(),
            },
        })
    }
}

/// Confirms every profile with account `<profile>-acct` unless it is listed as rejected.
#[derive(Default)]
pub(crate) struct FakeIdentity {
    pub(crate) rejected: Vec<String>,
    pub(crate) accounts: BTreeMap<String, String>,
    pub(crate) checked: Vec<String>,
}

impl FakeIdentity {
    pub(crate) fn rejecting(profile: &str) -> Self {
        Self {
            rejected: vec![profile.to_string()],
            ..Self::default()
        }
    }
}

impl IdentityProvider for FakeIdentity {
    fn caller_identity(&mut self, profile: &str, _region: &str) -> Result<CallerIdentity, IdentityError> {
        self.checked.push(profile.to_string());
        if self.rejected.iter().any(|p| p == profile) {
            return Err(IdentityError::CallFailed {
                profile: profile.to_string(),
                stderr: "ExpiredToken".to_string(),
            });
        }
        let account = self
            .accounts
            .get(profile)
            .cloned()
            .unwrap_or_else(|| format!("{profile}-acct"));
        Ok(CallerIdentity {
            arn: format!("arn:aws:iam::{account}:user/test"),
            account,
        })
    }
}

/// Keeps every event as a line of text.
#[derive(Default)]
pub(crate) struct RecordingReporter {
    pub(crate) events: Vec<String>,
}

impl RunReporter for RecordingReporter {
    fn identity_confirmed(&mut self, profile: &str, identity: &CallerIdentity) {
        self.events.push(format!("identity ok {profile} {}", identity.account));
    }

    fn identity_rejected(&mut self, profile: &str, _error: &IdentityError) {
        self.events.push(format!("identity ng {profile}"));
    }

    fn command_started(&mut self, name: &str, mode: Mode) {
        self.events.push(format!("start {name} {mode:?}"));
    }

    fn node_started(&mut self, profile: &str, node: &str, depth: usize, _argv: &[String]) {
        self.events.push(format!("run {node} {profile} {depth}"));
    }

    fn node_finished(&mut self, report: &NodeReport) {
        self.events
            .push(format!("done {} {} {:?}", report.node, report.profile, report.status));
    }

    fn command_finished(&mut self, name: &str, mode: Mode) {
        self.events.push(format!("finish {name} {mode:?}"));
    }
}
