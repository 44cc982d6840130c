// src/core/mod.rs

pub mod capture;
pub mod config_loader;
pub mod context_resolver;
pub mod graph_display;
pub mod interpolator;
pub mod orchestrator;
pub mod paths;
pub mod predicate;
pub mod profiles;
pub mod query;
pub mod report;
pub mod task_executor;
