//! Bandline Runner: evaluation orchestration on top of `bandline-core`.
//!
//! This crate provides:
//! - TOML runner configuration with anyhow-wrapped file loading
//! - A memoizing evaluator that computes each indicator spec once per dataset
//! - Parallel evaluation of many independent `(instrument, timeframe)` contexts
//! - Versioned JSON export of context outputs

pub mod config;
pub mod contexts;
pub mod evaluator;

pub use config::{load_config, RunnerConfig};
pub use contexts::{evaluate_contexts, export_contexts, ContextOutput, SCHEMA_VERSION};
pub use evaluator::{Evaluator, IndicatorSpec, SeriesOutput};
