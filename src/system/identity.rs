// src/system/identity.rs

use crate::{
    constants::{TOOL_ENV_OVERRIDES, TOOL_PROGRAM},
    system::executor::{self, ExecutionError},
};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while checking a profile's identity.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("sts failed for {profile}")]
    CallFailed { profile: String, stderr: String },
    #[error("sts could not be run for {profile}: {source}")]
    Spawn {
        profile: String,
        #[source]
        source: ExecutionError,
    },
    #[error("sts json parse failed for {profile}: {source}")]
    Parse {
        profile: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("sts returned empty {field} for {profile}")]
    EmptyField {
        profile: String,
        field: &'static str,
    },
}

impl IdentityError {
    /// Stderr of the failed call, when there was one.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::CallFailed { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}

/// Proof that a profile's credentials work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: String,
    pub arn: String,
}

/// Confirms a profile is usable and returns the account it belongs to.
pub trait IdentityProvider {
    fn caller_identity(&mut self, profile: &str, region: &str) -> Result<CallerIdentity, IdentityError>;
}

/// Identity check backed by `aws sts get-caller-identity`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StsIdentity;

impl IdentityProvider for StsIdentity {
    fn caller_identity(&mut self, profile: &str, region: &str) -> Result<CallerIdentity, IdentityError> {
        let argv: Vec<String> = [
            TOOL_PROGRAM,
            "--profile",
            profile,
            "--region",
            region,
            "--output",
            "json",
            "sts",
            "get-caller-identity",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let output =
            executor::run_captured(&argv, TOOL_ENV_OVERRIDES).map_err(|source| IdentityError::Spawn {
                profile: profile.to_string(),
                source,
            })?;

        if output.code != Some(0) {
            return Err(IdentityError::CallFailed {
                profile: profile.to_string(),
                stderr: output.stderr,
            });
        }

        parse_identity(profile, &output.stdout)
    }
}

#[derive(Deserialize)]
struct StsResponse {
    #[serde(rename = "Account", default)]
    account: String,
    #[serde(rename = "Arn", default)]
    arn: String,
}

/// Parses the JSON printed by `sts get-caller-identity`.
pub fn parse_identity(profile: &str, stdout: &[u8]) -> Result<CallerIdentity, IdentityError> {
    let data: StsResponse = serde_json::from_slice(stdout).map_err(|source| IdentityError::Parse {
        profile: profile.to_string(),
        source,
    })?;

    if data.account.trim().is_empty() {
        return Err(IdentityError::EmptyField {
            profile: profile.to_string(),
            field: "Account",
        });
    }
    if data.arn.trim().is_empty() {
        return Err(IdentityError::EmptyField {
            profile: profile.to_string(),
            field: "Arn",
        });
    }

    Ok(CallerIdentity {
        account: data.account,
        arn: data.arn,
    })
}
