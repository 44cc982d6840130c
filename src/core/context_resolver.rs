// src/core/context_resolver.rs

//! # Context Resolver
//!
//! Builds the variable environment for one profile. Layers are merged in a fixed
//! precedence order (built-ins > per-profile vars > default vars) and the result is
//! closed under `${NAME}` expansion until no value changes.
//!
//! Built-in names are protected at every merge step: a layer that defines `PROFILE`
//! or `ACCOUNT_ID` is not an error, its entry is simply ignored.

use crate::{
    constants::{MAX_RESOLVE_PASSES, is_builtin_var},
    core::interpolator::{self, InterpolationError},
    models::{Builtins, Environment, VarLayer},
};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised while building a profile environment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error(transparent)]
    Interpolation(#[from] InterpolationError),
    #[error("unresolved variable remains in {key}: {value}{}", cycle_suffix(.cycle))]
    Unresolved {
        key: String,
        value: String,
        /// The reference path, when the leftover is caused by a cycle.
        cycle: Option<String>,
    },
}

fn cycle_suffix(cycle: &Option<String>) -> String {
    cycle
        .as_ref()
        .map(|c| format!(" (circular reference: {c})"))
        .unwrap_or_default()
}

type ResolveResult<T> = Result<T, ResolveError>;

// --- PUBLIC API ---

/// Produces the fully resolved environment for one profile.
pub fn build_environment(
    builtins: &Builtins,
    defaults: &VarLayer,
    profile_layer: Option<&VarLayer>,
) -> ResolveResult<Environment> {
    let mut env = builtins.to_environment();
    merge_layer(&mut env, Some(defaults));
    merge_layer(&mut env, profile_layer);
    resolve(env)
}

/// Merges `layer` into `env`, overwriting existing keys except built-ins.
pub fn merge_layer(env: &mut Environment, layer: Option<&VarLayer>) {
    let Some(layer) = layer else {
        return;
    };
    for (key, value) in layer {
        if is_builtin_var(key) {
            log::debug!("Ignoring variable '{}': built-in names cannot be overridden.", key);
            continue;
        }
        env.insert(key.clone(), value.clone());
    }
}

/// Closes `env` under template expansion.
///
/// 1. Rejects reference cycles up front, naming the cycle.
/// 2. Re-expands every value, in sorted key order, until a pass changes nothing.
/// 3. Fails if any value still carries placeholder syntax.
pub fn resolve(mut env: Environment) -> ResolveResult<Environment> {
    if let Some(cycle) = find_cycle(&env) {
        let key = cycle.first().cloned().unwrap_or_default();
        let value = env.get(&key).cloned().unwrap_or_default();
        return Err(ResolveError::Unresolved {
            key,
            value,
            cycle: Some(cycle.join(" -> ")),
        });
    }

    // An acyclic chain never needs more passes than there are variables.
    let max_passes = MAX_RESOLVE_PASSES.max(env.len() + 1);
    let keys: Vec<String> = env.keys().cloned().collect();

    for pass in 0..max_passes {
        let mut changed = false;
        for key in &keys {
            let Some(current) = env.get(key) else {
                continue;
            };
            let expansion = interpolator::expand(current, &env)?;
            if !expansion.is_noop(current) {
                log::trace!("pass {}: {} -> '{}'", pass, key, expansion.text);
                env.insert(key.clone(), expansion.text);
                changed = true;
            }
        }
        if !changed {
            log::debug!("Environment stabilized after {} pass(es).", pass + 1);
            break;
        }
    }

    validate_resolved(&env)?;
    Ok(env)
}

/// Fails on the first (sorted) key whose value still contains a placeholder.
pub fn validate_resolved(env: &Environment) -> ResolveResult<()> {
    match env.iter().find(|(_, v)| interpolator::has_placeholder(v)) {
        Some((key, value)) => Err(ResolveError::Unresolved {
            key: key.clone(),
            value: value.clone(),
            cycle: None,
        }),
        None => Ok(()),
    }
}

// --- Cycle detection ---

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Finds a reference cycle among the variables of `env`, returned as a closed path
/// (`["A", "B", "A"]`). References to names missing from `env` are not edges; the
/// expander reports those.
fn find_cycle(env: &Environment) -> Option<Vec<String>> {
    let mut marks: BTreeMap<&str, Mark> = BTreeMap::new();
    let mut stack: Vec<&str> = Vec::new();
    for key in env.keys() {
        if let Some(cycle) = visit(key, env, &mut marks, &mut stack) {
            return Some(cycle);
        }
    }
    None
}

fn visit<'a>(
    key: &'a str,
    env: &'a Environment,
    marks: &mut BTreeMap<&'a str, Mark>,
    stack: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    match marks.get(key) {
        Some(Mark::Done) => return None,
        Some(Mark::Visiting) => {
            let start = stack.iter().position(|k| *k == key).unwrap_or(0);
            let mut cycle: Vec<String> = stack
                .iter()
                .skip(start)
                .map(|k| k.to_string())
                .collect();
            cycle.push(key.to_string());
            return Some(cycle);
        }
        None => {}
    }

    marks.insert(key, Mark::Visiting);
    stack.push(key);
    if let Some((_, value)) = env.get_key_value(key) {
        for name in interpolator::referenced_names(value) {
            if let Some((dep, _)) = env.get_key_value(name)
                && let Some(cycle) = visit(dep, env, marks, stack)
            {
                return Some(cycle);
            }
        }
    }
    stack.pop();
    marks.insert(key, Mark::Done);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtins() -> Builtins {
        Builtins {
            profile: "dev".to_string(),
            region: "ap-northeast-1".to_string(),
            account_id: "123456789012".to_string(),
            run_id: Some("20260101-000000-000-abcdef".to_string()),
        }
    }

    fn layer(pairs: &[(&str, &str)]) -> VarLayer {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_builtins_cannot_be_overridden_by_any_layer() {
        let defaults = layer(&[("PROFILE", "evil"), ("REGION", "us-west-2"), ("X", "1")]);
        let profile = layer(&[("ACCOUNT_ID", "000000000000"), ("RUN_ID", "nope")]);
        let env = build_environment(&builtins(), &defaults, Some(&profile)).unwrap();
        assert_eq!(env["PROFILE"], "dev");
        assert_eq!(env["REGION"], "ap-northeast-1");
        assert_eq!(env["ACCOUNT_ID"], "123456789012");
        assert_eq!(env["RUN_ID"], "20260101-000000-000-abcdef");
        assert_eq!(env["X"], "1");
    }

    #[test]
    fn test_profile_layer_wins_over_defaults() {
        let defaults = layer(&[("ENV", "dev"), ("TEAM", "core")]);
        let profile = layer(&[("ENV", "prod")]);
        let env = build_environment(&builtins(), &defaults, Some(&profile)).unwrap();
        assert_eq!(env["ENV"], "prod");
        assert_eq!(env["TEAM"], "core");
    }

    #[test]
    fn test_chained_references_resolve_transitively() {
        let defaults = layer(&[("A", "${B}"), ("B", "x")]);
        let env = build_environment(&builtins(), &defaults, None).unwrap();
        assert_eq!(env["A"], "x");
    }

    #[test]
    fn test_references_to_builtins_resolve() {
        let defaults = layer(&[("BUCKET", "logs-${ACCOUNT_ID}-${REGION}")]);
        let env = build_environment(&builtins(), &defaults, None).unwrap();
        assert_eq!(env["BUCKET"], "logs-123456789012-ap-northeast-1");
    }

    #[test]
    fn test_self_reference_is_rejected_as_unresolved() {
        let defaults = layer(&[("A", "${A}")]);
        let err = build_environment(&builtins(), &defaults, None).unwrap_err();
        match err {
            ResolveError::Unresolved { key, cycle, .. } => {
                assert_eq!(key, "A");
                assert_eq!(cycle.as_deref(), Some("A -> A"));
            }
            other => panic!("expected unresolved error, got {other:?}"),
        }
    }

    #[test]
    fn test_mutual_reference_is_rejected() {
        let defaults = layer(&[("A", "${B}"), ("B", "pre-${A}")]);
        let err = build_environment(&builtins(), &defaults, None).unwrap_err();
        assert!(matches!(err, ResolveError::Unresolved { cycle: Some(ref c), .. } if c == "A -> B -> A"));
        assert!(err.to_string().contains("unresolved variable"));
    }

    #[test]
    fn test_missing_reference_fails_with_undefined_variable() {
        let defaults = layer(&[("A", "${UNSET}")]);
        let err = build_environment(&builtins(), &defaults, None).unwrap_err();
        assert_eq!(
            err,
            ResolveError::Interpolation(InterpolationError::UndefinedVariable {
                name: "UNSET".to_string(),
                template: "${UNSET}".to_string(),
            })
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let defaults = layer(&[("A", "${B}-${C}"), ("B", "${C}"), ("C", "z")]);
        let env = build_environment(&builtins(), &defaults, None).unwrap();
        let again = resolve(env.clone()).unwrap();
        assert_eq!(env, again);
        assert_eq!(env["A"], "z-z");
    }

    #[test]
    fn test_long_chain_beyond_fixed_pass_count_resolves() {
        // V00 -> V01 -> ... -> V39 = "end"
        let mut defaults = VarLayer::new();
        for i in 0..40 {
            let value = if i == 39 {
                "end".to_string()
            } else {
                format!("${{V{:02}}}", i + 1)
            };
            defaults.insert(format!("V{:02}", i), value);
        }
        let env = build_environment(&builtins(), &defaults, None).unwrap();
        assert!(env.iter().filter(|(k, _)| k.starts_with('V')).all(|(_, v)| v == "end"));
    }

    #[test]
    fn test_validate_resolved_names_offending_key() {
        let mut env = Environment::new();
        env.insert("OK".to_string(), "fine".to_string());
        env.insert("BAD".to_string(), "still ${HERE}".to_string());
        let err = validate_resolved(&env).unwrap_err();
        assert_eq!(
            err,
            ResolveError::Unresolved {
                key: "BAD".to_string(),
                value: "still ${HERE}".to_string(),
                cycle: None,
            }
        );
    }
}
