// src/core/interpolator.rs

//! # Interpolator
//!
//! Expands `${NAME}` placeholders against a flat [`Environment`]. Expansion is strict:
//! a placeholder naming a variable that does not exist is an error, never a blank.
//!
//! Expansion is single-level. A substituted value is not scanned again, so
//! `A="${B}"`, `B="${C}"` expands `${A}` to `${B}`; reaching the fixed point is the
//! job of the caller (see `context_resolver`).

use crate::models::Environment;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    /// `${NAME}` where NAME is uppercase letters, digits and underscores.
    static ref PLACEHOLDER_RE: Regex =
        Regex::new(r"\$\{([A-Z0-9_]+)\}").expect("placeholder pattern is valid");
}

/// Errors raised while expanding `${NAME}` placeholders.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpolationError {
    #[error("undefined variable: {name} (in '{template}')")]
    UndefinedVariable { name: String, template: String },
}

/// The outcome of a successful expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub text: String,
    /// True if at least one placeholder was substituted.
    pub replaced: bool,
}

impl Expansion {
    /// True if the expansion did not alter its input, i.e. a fixed point.
    pub fn is_noop(&self, original: &str) -> bool {
        self.text == original
    }
}

/// Expands every `${NAME}` in `template` using `env`.
///
/// Fails on the first placeholder whose name is absent from `env`; no partial
/// output is produced in that case.
pub fn expand(template: &str, env: &Environment) -> Result<Expansion, InterpolationError> {
    let mut text = String::with_capacity(template.len());
    let mut last = 0;
    let mut replaced = false;

    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = env
            .get(name.as_str())
            .ok_or_else(|| InterpolationError::UndefinedVariable {
                name: name.as_str().to_string(),
                template: template.to_string(),
            })?;

        text.push_str(template.get(last..whole.start()).unwrap_or_default());
        text.push_str(value);
        last = whole.end();
        replaced = true;
    }
    text.push_str(template.get(last..).unwrap_or_default());

    Ok(Expansion { text, replaced })
}

/// Shorthand for [`expand`] when only the resulting text matters.
pub fn expand_str(template: &str, env: &Environment) -> Result<String, InterpolationError> {
    expand(template, env).map(|e| e.text)
}

/// True if `text` still contains placeholder syntax.
pub fn has_placeholder(text: &str) -> bool {
    PLACEHOLDER_RE.is_match(text)
}

/// Names referenced by placeholders in `text`, in order of appearance.
pub fn referenced_names(text: &str) -> impl Iterator<Item = &str> {
    PLACEHOLDER_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// True if `name` is a valid variable identifier.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_expand_replaces_all_occurrences() {
        let e = env(&[("PROFILE", "dev"), ("REGION", "us-east-1")]);
        let out = expand("${PROFILE}-${REGION}-${PROFILE}", &e).unwrap();
        assert_eq!(out.text, "dev-us-east-1-dev");
        assert!(out.replaced);
    }

    #[test]
    fn test_expand_without_placeholders_is_noop() {
        let out = expand("plain text", &Environment::new()).unwrap();
        assert_eq!(out.text, "plain text");
        assert!(!out.replaced);
        assert!(out.is_noop("plain text"));
    }

    #[test]
    fn test_undefined_variable_is_an_error_not_a_blank() {
        let err = expand("bucket-${UNSET}", &env(&[("OTHER", "x")])).unwrap_err();
        assert_eq!(
            err,
            InterpolationError::UndefinedVariable {
                name: "UNSET".to_string(),
                template: "bucket-${UNSET}".to_string(),
            }
        );
        assert!(err.to_string().contains("UNSET"));
    }

    #[test]
    fn test_expansion_is_single_level() {
        let e = env(&[("A", "${B}"), ("B", "x")]);
        let out = expand("${A}", &e).unwrap();
        assert_eq!(out.text, "${B}");
    }

    #[test]
    fn test_lowercase_and_malformed_tokens_are_left_alone() {
        let e = env(&[("A", "1")]);
        let out = expand("${a} $A ${A", &e).unwrap();
        assert_eq!(out.text, "${a} $A ${A");
        assert!(!out.replaced);
        assert!(!has_placeholder(&out.text));
    }

    #[test]
    fn test_self_substitution_reports_replaced_but_noop() {
        let e = env(&[("A", "${A}")]);
        let out = expand("${A}", &e).unwrap();
        assert!(out.replaced);
        assert!(out.is_noop("${A}"));
    }

    #[test]
    fn test_referenced_names_and_valid_names() {
        let names: Vec<_> = referenced_names("${A}/${B_2}/${a}").collect();
        assert_eq!(names, vec!["A", "B_2"]);
        assert!(is_valid_name("VPC_ID"));
        assert!(!is_valid_name("vpc_id"));
        assert!(!is_valid_name(""));
    }
}
