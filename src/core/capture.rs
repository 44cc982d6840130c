// src/core/capture.rs

use crate::{
    constants::is_builtin_var,
    core::query::{JsonQuery, QueryError},
    models::Environment,
};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised while applying a node's captures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("capture requested but the command produced no JSON output")]
    NoJson,
    #[error("capture of '{var}' failed: query '{query}': {source}")]
    Query {
        var: String,
        query: String,
        #[source]
        source: QueryError,
    },
}

/// Canonical text form of a JSON value, shared by capture and predicate comparison.
///
/// `null` is empty, strings are taken verbatim (no quotes), scalars use their JSON
/// text and arrays/objects their compact JSON serialization.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Runs every capture query against `last_json` and stores the results in `env`.
///
/// All queries are evaluated before anything is written, so a failing capture leaves
/// `env` untouched. Captures into built-in names are skipped. Returns the pairs that
/// were actually written, in variable-name order.
pub fn apply_captures(
    spec: &BTreeMap<String, String>,
    last_json: Option<&Value>,
    env: &mut Environment,
    query: &dyn JsonQuery,
) -> Result<Vec<(String, String)>, CaptureError> {
    if spec.is_empty() {
        return Ok(Vec::new());
    }
    let document = last_json.ok_or(CaptureError::NoJson)?;

    let mut captured = Vec::with_capacity(spec.len());
    for (var, expr) in spec {
        let result = query
            .evaluate(expr, document)
            .map_err(|source| CaptureError::Query {
                var: var.clone(),
                query: expr.clone(),
                source,
            })?;
        if is_builtin_var(var) {
            log::debug!("Ignoring capture into built-in variable '{}'.", var);
            continue;
        }
        captured.push((var.clone(), stringify(&result)));
    }

    for (var, value) in &captured {
        log::debug!("captured {}='{}'", var, value);
        env.insert(var.clone(), value.clone());
    }
    Ok(captured)
}
