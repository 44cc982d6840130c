// src/models.rs

use crate::constants::{DEFAULT_REGION, VAR_ACCOUNT_ID, VAR_PROFILE, VAR_REGION, VAR_RUN_ID};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A resolved, string-valued variable set for one profile.
///
/// A `BTreeMap` keeps iteration sorted, which is what makes resolution reproducible.
pub type Environment = BTreeMap<String, String>;

/// A raw variable layer as written in the configuration file.
pub type VarLayer = BTreeMap<String, String>;

// --- CONFIGURATION MODELS (What is read from the configuration file) ---

/// Represents the deserialized structure of a run configuration file.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub targets: TargetsConfig,
    #[serde(default)]
    pub vars: VarsConfig,
    #[serde(default)]
    pub cmd: Vec<CommandNode>,
}

impl RunConfig {
    /// The region every profile is targeted at, falling back to the built-in default.
    pub fn region(&self) -> &str {
        self.defaults
            .region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REGION)
    }

    /// The per-profile variable layer for `profile`, if the configuration declares one.
    pub fn profile_vars(&self, profile: &str) -> Option<&VarLayer> {
        self.vars.profiles.get(profile)
    }
}

/// The `defaults` section.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub region: Option<String>,
}

/// The `targets` section.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetsConfig {
    /// Explicit profile list. Empty means "discover from the local AWS config".
    #[serde(default)]
    pub profiles: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// The `vars` section: shared defaults and per-profile overrides.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct VarsConfig {
    #[serde(default, deserialize_with = "scalar_layer")]
    pub defaults: VarLayer,
    #[serde(default, deserialize_with = "scalar_layers")]
    pub profiles: BTreeMap<String, VarLayer>,
}

/// One node of the command tree.
///
/// The same tree is shared, read-only, by every profile of a run.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CommandNode {
    pub name: String,
    /// Arguments passed to the tool after the fixed targeting flags.
    pub run: Vec<String>,
    /// Variable name -> query evaluated against this node's JSON output.
    #[serde(default)]
    pub capture: BTreeMap<String, String>,
    #[serde(default)]
    pub when: Option<PredicateSpec>,
    #[serde(default, rename = "then")]
    pub on_true: Vec<CommandNode>,
    #[serde(default, rename = "else")]
    pub on_false: Vec<CommandNode>,
}

impl CommandNode {
    /// Convenience constructor, mostly used by tests and tooling.
    pub fn new(name: impl Into<String>, run: &[&str]) -> Self {
        Self {
            name: name.into(),
            run: run.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .on_true
            .iter()
            .chain(self.on_false.iter())
            .map(Self::subtree_len)
            .sum::<usize>()
    }
}

/// A branch condition: `query` is run against the node's JSON output and compared
/// against `value` (itself a template) with `op`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PredicateSpec {
    pub query: String,
    /// Operator name. Kept as text so an unknown operator surfaces as an evaluation error.
    #[serde(default)]
    pub op: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub value: String,
}

// --- ENGINE MODELS ---

/// The values no configuration layer can override for one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Builtins {
    pub profile: String,
    pub region: String,
    pub account_id: String,
    pub run_id: Option<String>,
}

impl Builtins {
    /// Seeds a fresh environment with the built-in variables.
    pub fn to_environment(&self) -> Environment {
        let mut env = Environment::new();
        env.insert(VAR_PROFILE.to_string(), self.profile.clone());
        env.insert(VAR_REGION.to_string(), self.region.clone());
        env.insert(VAR_ACCOUNT_ID.to_string(), self.account_id.clone());
        if let Some(run_id) = &self.run_id {
            env.insert(VAR_RUN_ID.to_string(), run_id.clone());
        }
        env
    }
}

// --- Scalar-tolerant deserialization ---
// Config authors write `PORT: 8080` or `value: true`; both land as strings.

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Str(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

fn scalar_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<Scalar>::deserialize(d)?
        .map(String::from)
        .unwrap_or_default())
}

fn scalar_layer<'de, D: Deserializer<'de>>(d: D) -> Result<VarLayer, D::Error> {
    let raw = Option::<BTreeMap<String, Scalar>>::deserialize(d)?.unwrap_or_default();
    Ok(raw.into_iter().map(|(k, v)| (k, v.into())).collect())
}

fn scalar_layers<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeMap<String, VarLayer>, D::Error> {
    let raw = Option::<BTreeMap<String, Option<BTreeMap<String, Scalar>>>>::deserialize(d)?
        .unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|(profile, layer)| {
            let layer = layer
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, v.into()))
                .collect();
            (profile, layer)
        })
        .collect())
}
