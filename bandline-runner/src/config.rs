//! Runner configuration: the shared pipeline parameters plus execution knobs.

use std::path::Path;

use anyhow::{Context, Result};
use bandline_core::config::ConfigError;
use bandline_core::PipelineConfig;
use serde::{Deserialize, Serialize};

/// Top-level runner configuration, loaded from TOML.
///
/// ```toml
/// parallel = true
///
/// [pipeline.trend_band]
/// period = 10
/// multiplier = 3.0
/// ```
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Evaluate independent contexts on the rayon pool.
    pub parallel: bool,
    pub pipeline: PipelineConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Parse and validate.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.pipeline.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Read a runner config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<RunnerConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    RunnerConfig::from_toml_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))
}
