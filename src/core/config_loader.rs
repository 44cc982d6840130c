// src/core/config_loader.rs

//! # Config Loader
//!
//! Reads a run configuration from disk and validates it before any profile is touched.
//! The format is picked by extension: `.toml` is parsed as TOML, everything else as YAML.

use crate::{
    core::{interpolator, predicate::Operator, query},
    models::{CommandNode, RunConfig},
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Represents errors that can occur while loading a run configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The YAML content is invalid and could not be parsed.
    #[error("Failed to parse YAML file at '{path}': {source}")]
    YamlParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    /// The TOML content is invalid and could not be parsed.
    #[error("Failed to parse TOML file at '{path}': {source}")]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// The file parsed, but describes something that cannot run.
    #[error("Invalid config '{path}': {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// On-disk configuration syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }
}

/// Loads, parses and validates the configuration at `path`.
pub fn load_config(path: &Path) -> Result<RunConfig, ConfigError> {
    log::debug!("Loading run config from {:?}", path);
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&content, ConfigFormat::from_path(path), path)?;
    validate(&config).map_err(|reason| ConfigError::Invalid {
        path: path.to_path_buf(),
        reason,
    })?;
    log::debug!(
        "Loaded {} top-level command(s), {} node(s) total",
        config.cmd.len(),
        config.cmd.iter().map(CommandNode::subtree_len).sum::<usize>()
    );
    Ok(config)
}

/// Parses configuration text. `path` is only used for error messages.
pub fn parse_config(content: &str, format: ConfigFormat, path: &Path) -> Result<RunConfig, ConfigError> {
    match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|source| ConfigError::YamlParse {
            path: path.to_path_buf(),
            source,
        }),
        ConfigFormat::Toml => toml::from_str(content).map_err(|source| ConfigError::TomlParse {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Structural checks that serde cannot express.
pub fn validate(config: &RunConfig) -> Result<(), String> {
    if config.cmd.is_empty() {
        return Err("No cmd to run.".to_string());
    }
    for (i, node) in config.cmd.iter().enumerate() {
        validate_node(node, &format!("cmd[{i}]"))?;
    }
    Ok(())
}

fn validate_node(node: &CommandNode, at: &str) -> Result<(), String> {
    if node.name.trim().is_empty() {
        return Err(format!("{at}: name is empty"));
    }
    let at = format!("{at} '{}'", node.name);
    if node.run.is_empty() {
        return Err(format!("{at}: run is empty"));
    }
    for (var, q) in &node.capture {
        if !interpolator::is_valid_name(var) {
            return Err(format!(
                "{at}: capture name '{var}' must match [A-Z0-9_]+"
            ));
        }
        query::validate(q).map_err(|e| format!("{at}: capture {var}: {e}"))?;
    }
    if let Some(when) = &node.when {
        Operator::parse_opt(when.op.as_deref()).map_err(|e| format!("{at}: {e}"))?;
        query::validate(&when.query).map_err(|e| format!("{at}: when: {e}"))?;
    }
    for (i, child) in node.on_true.iter().enumerate() {
        validate_node(child, &format!("{at}.then[{i}]"))?;
    }
    for (i, child) in node.on_false.iter().enumerate() {
        validate_node(child, &format!("{at}.else[{i}]"))?;
    }
    Ok(())
}
