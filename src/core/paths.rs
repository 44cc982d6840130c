// src/core/paths.rs

use crate::constants::{AWS_CONFIG_RELATIVE_PATH, LOG_DIR};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while resolving filesystem paths.
#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find home directory.")]
    HomeDirNotFound,
    #[error("Failed to expand path '{template}': {reason}")]
    Expansion { template: String, reason: String },
}

/// Expands `~` and environment variables (`$VAR`) in a user-supplied path.
pub fn expand_user_path(template: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(template).map_err(|e| PathError::Expansion {
        template: template.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Returns the path of the shared AWS config file (`~/.aws/config`).
pub fn aws_config_path() -> Result<PathBuf, PathError> {
    dirs::home_dir()
        .map(|home| home.join(AWS_CONFIG_RELATIVE_PATH))
        .ok_or(PathError::HomeDirNotFound)
}

/// Returns the transcript file for `run_id` under `base`.
///
/// `base` is canonicalized when it exists so the path printed to the operator is absolute.
pub fn run_log_path(base: &Path, run_id: &str) -> PathBuf {
    let dir = base.join(LOG_DIR);
    let dir = dunce::canonicalize(&dir).unwrap_or(dir);
    dir.join(format!("{run_id}.txt"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_user_path_handles_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_user_path("~/run.yaml").unwrap(), home.join("run.yaml"));
        assert_eq!(expand_user_path("plain.yaml").unwrap(), PathBuf::from("plain.yaml"));
    }

    #[test]
    fn test_expand_user_path_rejects_unknown_variable() {
        let err = expand_user_path("$NECRO_SURELY_UNSET_VARIABLE/x.yaml").unwrap_err();
        assert!(matches!(err, PathError::Expansion { .. }));
    }

    #[test]
    fn test_run_log_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(LOG_DIR)).unwrap();
        let path = run_log_path(dir.path(), "20260101-000000-000-abcdef");
        assert!(path.is_absolute());
        assert!(path.ends_with("log/20260101-000000-000-abcdef.txt"));
    }
}
