//! # necro
//!
//! Runs a declarative tree of AWS CLI commands across many named profiles. Each top-level
//! command finishes for every profile before the next one starts, and the first failure
//! anywhere stops the whole run.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic))]

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod system;

#[cfg(test)]
pub(crate) mod test_support;
