//! Multi-context evaluation and JSON export.
//!
//! A context is one `(instrument, timeframe)` series. Contexts share nothing
//! but the configuration, so each gets its own fresh pipeline state and they
//! can run on separate threads.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bandline_core::config::ConfigError;
use bandline_core::domain::{BarSeries, DatasetHash};
use bandline_core::{Pipeline, PipelineOutput};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::RunnerConfig;

/// Version of the exported JSON layout. Newer versions are rejected on load.
pub const SCHEMA_VERSION: u32 = 1;

/// Full pipeline output for one context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextOutput {
    pub schema_version: u32,
    pub instrument: String,
    pub timeframe: String,
    pub dataset_hash: DatasetHash,
    pub output: PipelineOutput,
}

impl ContextOutput {
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize context output to JSON")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let out: Self =
            serde_json::from_str(json).context("failed to deserialize context output from JSON")?;
        if out.schema_version > SCHEMA_VERSION {
            bail!(
                "unsupported schema version {} (max supported: {})",
                out.schema_version,
                SCHEMA_VERSION
            );
        }
        Ok(out)
    }

    /// `{instrument}_{timeframe}.json`, with path separators replaced.
    pub fn file_name(&self) -> String {
        let sanitize = |s: &str| s.replace(['/', '\\', ' '], "-");
        format!("{}_{}.json", sanitize(&self.instrument), sanitize(&self.timeframe))
    }

    /// Write to `dir/{file_name}` and return the path.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, self.to_json_pretty()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

fn evaluate_one(pipeline: &Pipeline, series: &BarSeries) -> ContextOutput {
    ContextOutput {
        schema_version: SCHEMA_VERSION,
        instrument: series.instrument.clone(),
        timeframe: series.timeframe.clone(),
        dataset_hash: series.dataset_hash(),
        output: pipeline.run(series.bars()),
    }
}

/// Evaluate every series with the same configuration.
///
/// Output order matches input order whether or not `config.parallel` is set.
#[instrument(skip_all, fields(contexts = series.len(), parallel = config.parallel))]
pub fn evaluate_contexts(
    series: &[BarSeries],
    config: &RunnerConfig,
) -> Result<Vec<ContextOutput>, ConfigError> {
    // `run` starts from fresh state, so one validated pipeline serves all contexts.
    let pipeline = Pipeline::new(config.pipeline)?;

    let outputs: Vec<ContextOutput> = if config.parallel {
        series.par_iter().map(|s| evaluate_one(&pipeline, s)).collect()
    } else {
        series.iter().map(|s| evaluate_one(&pipeline, s)).collect()
    };

    let events: usize = outputs.iter().map(|o| o.output.events.len()).sum();
    info!(events, "contexts evaluated");
    Ok(outputs)
}

/// Write each output to `dir` and return the written paths in order.
pub fn export_contexts(outputs: &[ContextOutput], dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    outputs.iter().map(|o| o.write_to_dir(dir)).collect()
}
