// src/core/predicate.rs

//! # Predicate
//!
//! Decides which child list of a command node runs, by comparing one query result
//! from the node's JSON output against an expanded comparison value.

use crate::{
    core::{
        capture::stringify,
        interpolator::{self, InterpolationError},
        query::{JsonQuery, QueryError},
    },
    models::{Environment, PredicateSpec},
};
use serde_json::Value;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Errors raised while evaluating a `when` predicate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredicateError {
    #[error("predicate on '{query}' needs JSON output, but the command produced none")]
    NoJson { query: String },
    #[error("unknown predicate operator '{0}' (expected exists, eq, ne, contains, in)")]
    UnknownOperator(String),
    #[error("predicate query '{query}' failed: {source}")]
    Query {
        query: String,
        #[source]
        source: QueryError,
    },
    #[error("predicate comparison value: {0}")]
    Value(#[from] InterpolationError),
    #[error("'contains' on '{query}' needs a string or an array, got {kind}")]
    ContainsType { query: String, kind: &'static str },
}

/// Comparison applied between a query result and the expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Operator {
    Exists,
    #[default]
    Eq,
    Ne,
    Contains,
    In,
}

impl Operator {
    /// Parses an optional operator name; a missing or blank name means `eq`.
    pub fn parse_opt(op: Option<&str>) -> Result<Self, PredicateError> {
        match op.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => name.parse(),
            None => Ok(Self::default()),
        }
    }
}

impl FromStr for Operator {
    type Err = PredicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exists" => Ok(Self::Exists),
            "eq" => Ok(Self::Eq),
            "ne" => Ok(Self::Ne),
            "contains" => Ok(Self::Contains),
            "in" => Ok(Self::In),
            _ => Err(PredicateError::UnknownOperator(s.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Exists => "exists",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Contains => "contains",
            Self::In => "in",
        };
        f.write_str(name)
    }
}

/// Evaluates `spec` against the node's JSON output.
///
/// An absent predicate always passes. Any other predicate requires `last_json`.
pub fn evaluate(
    spec: Option<&PredicateSpec>,
    last_json: Option<&Value>,
    env: &Environment,
    query: &dyn JsonQuery,
) -> Result<bool, PredicateError> {
    let Some(spec) = spec else {
        return Ok(true);
    };
    let document = last_json.ok_or_else(|| PredicateError::NoJson {
        query: spec.query.clone(),
    })?;
    let op = Operator::parse_opt(spec.op.as_deref())?;

    let got = query
        .evaluate(&spec.query, document)
        .map_err(|source| PredicateError::Query {
            query: spec.query.clone(),
            source,
        })?;
    let want = interpolator::expand_str(&spec.value, env)?;

    let passed = match op {
        Operator::Exists => !got.is_null(),
        Operator::Eq => stringify(&got) == want,
        Operator::Ne => stringify(&got) != want,
        Operator::Contains => match &got {
            Value::String(s) => s.contains(want.as_str()),
            Value::Array(items) => items.iter().any(|item| stringify(item) == want),
            other => {
                return Err(PredicateError::ContainsType {
                    query: spec.query.clone(),
                    kind: json_kind(other),
                });
            }
        },
        Operator::In => {
            let got = stringify(&got);
            want.split(',').map(str::trim).any(|entry| entry == got)
        }
    };

    log::debug!(
        "predicate {} {} '{}' -> {}",
        spec.query,
        op,
        want,
        passed
    );
    Ok(passed)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::PathQuery;
    use serde_json::json;

    fn pred(query: &str, op: Option<&str>, value: &str) -> PredicateSpec {
        PredicateSpec {
            query: query.to_string(),
            op: op.map(str::to_string),
            value: value.to_string(),
        }
    }

    fn eval(spec: &PredicateSpec, doc: &Value) -> Result<bool, PredicateError> {
        evaluate(Some(spec), Some(doc), &Environment::new(), &PathQuery)
    }

    #[test]
    fn test_absent_predicate_passes_without_json() {
        assert!(evaluate(None, None, &Environment::new(), &PathQuery).unwrap());
    }

    #[test]
    fn test_missing_json_is_an_error_for_every_operator() {
        for op in ["exists", "eq", "ne", "contains", "in"] {
            let spec = pred("a", Some(op), "");
            let err = evaluate(Some(&spec), None, &Environment::new(), &PathQuery).unwrap_err();
            assert!(matches!(err, PredicateError::NoJson { .. }), "op {op}");
        }
    }

    #[test]
    fn test_exists() {
        let doc = json!({ "a": 0, "b": null });
        assert!(eval(&pred("a", Some("exists"), ""), &doc).unwrap());
        assert!(!eval(&pred("b", Some("exists"), ""), &doc).unwrap());
        assert!(!eval(&pred("c", Some("exists"), ""), &doc).unwrap());
    }

    #[test]
    fn test_eq_ne_and_default_operator() {
        let doc = json!({ "State": "running", "Count": 3, "Ok": true });
        assert!(eval(&pred("State", None, "running"), &doc).unwrap());
        assert!(eval(&pred("Count", Some("eq"), "3"), &doc).unwrap());
        assert!(eval(&pred("Ok", Some("EQ"), "true"), &doc).unwrap());
        assert!(eval(&pred("State", Some("ne"), "stopped"), &doc).unwrap());
        assert!(!eval(&pred("State", Some("ne"), "running"), &doc).unwrap());
        // A missing value stringifies to "", so it equals an empty template.
        assert!(eval(&pred("Missing", Some("eq"), ""), &doc).unwrap());
    }

    #[test]
    fn test_contains_on_strings_arrays_and_other_types() {
        let doc = json!({ "arn": "arn:aws:iam::1:role/admin", "tags": ["x", "y"], "n": 5 });
        assert!(eval(&pred("arn", Some("contains"), "role/"), &doc).unwrap());
        assert!(eval(&pred("tags", Some("contains"), "y"), &doc).unwrap());
        assert!(!eval(&pred("tags", Some("contains"), "z"), &doc).unwrap());
        let err = eval(&pred("n", Some("contains"), "5"), &doc).unwrap_err();
        assert_eq!(
            err,
            PredicateError::ContainsType {
                query: "n".to_string(),
                kind: "number",
            }
        );
    }

    #[test]
    fn test_in_trims_list_entries() {
        let doc = json!({ "v": "b", "n": 2 });
        assert!(eval(&pred("v", Some("in"), "a, b,c"), &doc).unwrap());
        assert!(eval(&pred("n", Some("in"), "1, 2"), &doc).unwrap());
        assert!(!eval(&pred("v", Some("in"), "[\"a\",\"b\"]"), &doc).unwrap());
    }

    #[test]
    fn test_comparison_value_is_expanded() {
        let doc = json!({ "Account": "123456789012" });
        let mut env = Environment::new();
        env.insert("ACCOUNT_ID".to_string(), "123456789012".to_string());
        let spec = pred("Account", Some("eq"), "${ACCOUNT_ID}");
        assert!(evaluate(Some(&spec), Some(&doc), &env, &PathQuery).unwrap());

        let spec = pred("Account", Some("eq"), "${UNSET}");
        let err = evaluate(Some(&spec), Some(&doc), &env, &PathQuery).unwrap_err();
        assert!(matches!(err, PredicateError::Value(_)));
    }

    #[test]
    fn test_unknown_operator_is_an_error() {
        let doc = json!({ "a": 1 });
        let err = eval(&pred("a", Some("gt"), "0"), &doc).unwrap_err();
        assert_eq!(err, PredicateError::UnknownOperator("gt".to_string()));
        assert_eq!(Operator::parse_opt(Some("  ")).unwrap(), Operator::Eq);
    }
}
