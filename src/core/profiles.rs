// src/core/profiles.rs

//! Selects the profiles a run targets: the explicit list from the configuration, or
//! every `[profile NAME]` section of the local AWS config, minus the exclusions.

use crate::{core::paths, models::TargetsConfig};
use std::{collections::HashSet, fs, path::Path};

/// Extracts profile names from AWS config text, in file order.
/// `[default]` and any other non-profile section are skipped.
pub fn parse_aws_config(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix("[profile ")?.strip_suffix(']'))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reads profile names from the AWS config file at `path`.
/// A missing or unreadable file yields no profiles.
pub fn discover_profiles(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(content) => parse_aws_config(&content),
        Err(e) => {
            log::warn!("cannot open {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Removes every excluded name, keeping the original order.
pub fn apply_exclude(profiles: Vec<String>, exclude: &[String]) -> Vec<String> {
    if exclude.is_empty() {
        return profiles;
    }
    let excluded: HashSet<&str> = exclude.iter().map(String::as_str).collect();
    profiles
        .into_iter()
        .filter(|p| !excluded.contains(p.as_str()))
        .collect()
}

/// Resolves the final target list for a run.
pub fn select_profiles(targets: &TargetsConfig) -> Vec<String> {
    let base = if targets.profiles.is_empty() {
        match paths::aws_config_path() {
            Ok(path) => discover_profiles(&path),
            Err(e) => {
                log::warn!("{}", e);
                Vec::new()
            }
        }
    } else {
        targets.profiles.clone()
    };
    apply_exclude(base, &targets.exclude)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AWS_CONFIG: &str = "\
[default]
region = us-east-1

[profile dev]
region = ap-northeast-1

  [profile  prod ]
sso_session = corp
[sso-session corp]
[profile legacy]
# [profile commented]
";

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_aws_config() {
        assert_eq!(parse_aws_config(AWS_CONFIG), names(&["dev", "prod", "legacy"]));
        assert!(parse_aws_config("").is_empty());
    }

    #[test]
    fn test_discover_profiles_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, AWS_CONFIG).unwrap();
        assert_eq!(discover_profiles(&path).len(), 3);
        assert!(discover_profiles(&dir.path().join("missing")).is_empty());
    }

    #[test]
    fn test_apply_exclude_keeps_order() {
        let all = names(&["c", "a", "b", "a"]);
        assert_eq!(apply_exclude(all.clone(), &[]), all);
        assert_eq!(apply_exclude(all, &names(&["a"])), names(&["c", "b"]));
    }

    #[test]
    fn test_explicit_profiles_win_over_discovery() {
        let targets = TargetsConfig {
            profiles: names(&["dev", "prod", "legacy"]),
            exclude: names(&["legacy"]),
        };
        assert_eq!(select_profiles(&targets), names(&["dev", "prod"]));

        let targets = TargetsConfig {
            profiles: names(&["dev"]),
            exclude: names(&["dev"]),
        };
        assert!(select_profiles(&targets).is_empty());
    }
}
