// src/core/query.rs

//! # Query
//!
//! Structured queries against the JSON a command printed. The engine only depends on
//! the [`JsonQuery`] trait; [`PathQuery`] is the built-in implementation, a small
//! JMESPath-style path language:
//!
//! | Syntax            | Meaning                                        |
//! |-------------------|------------------------------------------------|
//! | `Account`         | object field                                   |
//! | `"Key Name"`      | quoted object field                            |
//! | `a.b.c`           | nested fields                                  |
//! | `Items[0]`        | array index (`[-1]` counts from the end)       |
//! | `Items[*].Name`   | projection over an array                       |
//! | `Items[].Name`    | flatten one level, then project                |
//! | `@`               | the whole document                             |
//!
//! Missing fields and out-of-range indices evaluate to `null`, never to an error.
//! Projections drop `null` results.

use serde_json::Value;
use std::iter::Peekable;
use std::str::Chars;
use thiserror::Error;

/// Errors raised while parsing a query expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("empty query")]
    Empty,
    #[error("invalid query '{query}': {reason}")]
    Syntax { query: String, reason: String },
}

/// Evaluates a query against a JSON document.
pub trait JsonQuery {
    fn evaluate(&self, query: &str, document: &Value) -> Result<Value, QueryError>;
}

/// The built-in path-query engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathQuery;

impl JsonQuery for PathQuery {
    fn evaluate(&self, query: &str, document: &Value) -> Result<Value, QueryError> {
        let segments = parse(query)?;
        log::trace!("query '{}' parsed into {:?}", query, segments);
        Ok(apply(&segments, document))
    }
}

/// Checks that `query` is well-formed for [`PathQuery`] without evaluating it.
pub fn validate(query: &str) -> Result<(), QueryError> {
    parse(query).map(|_| ())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(i64),
    Project { flatten: bool },
}

// --- Parsing ---

fn parse(query: &str) -> Result<Vec<Segment>, QueryError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(QueryError::Empty);
    }
    if trimmed == "@" {
        return Ok(Vec::new());
    }

    let syntax = |reason: &str| QueryError::Syntax {
        query: query.to_string(),
        reason: reason.to_string(),
    };

    let mut chars = trimmed.chars().peekable();
    let mut segments = Vec::new();
    let mut expect_field = true;

    while let Some(&c) = chars.peek() {
        match c {
            '[' => {
                chars.next();
                segments.push(parse_bracket(&mut chars).map_err(|r| syntax(&r))?);
                expect_field = false;
            }
            '.' if !expect_field => {
                chars.next();
                expect_field = true;
                if chars.peek().is_none() {
                    return Err(syntax("trailing '.'"));
                }
            }
            '"' if expect_field => {
                chars.next();
                segments.push(Segment::Field(parse_quoted(&mut chars).map_err(|r| syntax(&r))?));
                expect_field = false;
            }
            c if expect_field && is_ident_start(c) => {
                segments.push(Segment::Field(parse_ident(&mut chars)));
                expect_field = false;
            }
            c => return Err(syntax(&format!("unexpected character '{c}'"))),
        }
    }

    Ok(segments)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn parse_ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            ident.push(c);
            chars.next();
        } else {
            break;
        }
    }
    ident
}

fn parse_quoted(chars: &mut Peekable<Chars<'_>>) -> Result<String, String> {
    let mut field = String::new();
    loop {
        match chars.next() {
            Some('"') => return Ok(field),
            Some('\\') => match chars.next() {
                Some(escaped) => field.push(escaped),
                None => return Err("unterminated escape".to_string()),
            },
            Some(c) => field.push(c),
            None => return Err("unterminated quoted field".to_string()),
        }
    }
}

fn parse_bracket(chars: &mut Peekable<Chars<'_>>) -> Result<Segment, String> {
    let mut inner = String::new();
    loop {
        match chars.next() {
            Some(']') => break,
            Some(c) => inner.push(c),
            None => return Err("unterminated '['".to_string()),
        }
    }
    match inner.trim() {
        "" => Ok(Segment::Project { flatten: true }),
        "*" => Ok(Segment::Project { flatten: false }),
        n => n
            .parse::<i64>()
            .map(Segment::Index)
            .map_err(|_| format!("invalid index '{n}'")),
    }
}

// --- Evaluation ---

fn apply(segments: &[Segment], value: &Value) -> Value {
    let Some((first, rest)) = segments.split_first() else {
        return value.clone();
    };

    match first {
        Segment::Field(name) => match value.get(name.as_str()) {
            Some(child) if value.is_object() => apply(rest, child),
            _ => Value::Null,
        },
        Segment::Index(i) => {
            let Some(items) = value.as_array() else {
                return Value::Null;
            };
            let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
            let idx = if *i < 0 { len + i } else { *i };
            usize::try_from(idx)
                .ok()
                .and_then(|idx| items.get(idx))
                .map(|child| apply(rest, child))
                .unwrap_or(Value::Null)
        }
        Segment::Project { flatten } => {
            let Some(items) = value.as_array() else {
                return Value::Null;
            };
            let elements: Vec<&Value> = if *flatten {
                items
                    .iter()
                    .flat_map(|item| match item {
                        Value::Array(inner) => inner.iter().collect::<Vec<_>>(),
                        other => vec![other],
                    })
                    .collect()
            } else {
                items.iter().collect()
            };
            // A later flatten ends this projection and applies to its collected result.
            let split = rest
                .iter()
                .position(|s| matches!(s, Segment::Project { flatten: true }))
                .unwrap_or(rest.len());
            let (rhs, tail) = rest.split_at(split);
            let projected = Value::Array(
                elements
                    .into_iter()
                    .map(|element| apply(rhs, element))
                    .filter(|v| !v.is_null())
                    .collect(),
            );
            if tail.is_empty() {
                projected
            } else {
                apply(tail, &projected)
            }
        }
    }
}
