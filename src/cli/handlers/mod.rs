// src/cli/handlers/mod.rs

pub mod help;
pub mod run;
pub mod version;
