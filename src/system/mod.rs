//! # System Interaction Layer
//!
//! The boundary between the engine and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: spawns external processes, streaming their output to the run's
//!   shared sink while capturing stdout for the engine.
//! - **`identity`**: the `sts get-caller-identity` check that confirms a profile works
//!   and yields its account id.
//! - **`run_log`**: the run identifier and the console+file transcript sink.

pub mod executor;
pub mod identity;
pub mod run_log;
