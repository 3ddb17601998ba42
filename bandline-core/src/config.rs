//! Parameter sets and their validation.
//!
//! Every parameter set is validated when the indicator is constructed. Nothing is
//! re-validated mid-stream: once a `Pipeline` exists, every bar is accepted on the
//! compute side and insufficiency shows up only as `None` outputs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::indicators::flow::FlowSource;

/// Errors raised when constructing indicators from invalid parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{indicator}: {param} must be >= {min}, got {value}")]
    PeriodTooSmall {
        indicator: &'static str,
        param: &'static str,
        min: usize,
        value: usize,
    },

    #[error("{indicator}: {param} must be finite and > 0, got {value}")]
    NotPositive {
        indicator: &'static str,
        param: &'static str,
        value: f64,
    },

    #[error("invalid TOML configuration: {0}")]
    Parse(String),
}

pub(crate) fn require_period(
    indicator: &'static str,
    param: &'static str,
    value: usize,
) -> Result<usize, ConfigError> {
    if value == 0 {
        return Err(ConfigError::PeriodTooSmall {
            indicator,
            param,
            min: 1,
            value,
        });
    }
    Ok(value)
}

pub(crate) fn require_positive(
    indicator: &'static str,
    param: &'static str,
    value: f64,
) -> Result<f64, ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::NotPositive {
            indicator,
            param,
            value,
        });
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeParams {
    pub period: usize,
}

impl Default for RangeParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendBandParams {
    pub period: usize,
    pub multiplier: f64,
}

impl Default for TrendBandParams {
    fn default() -> Self {
        Self {
            period: 10,
            multiplier: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowTrendParams {
    pub atr_period: usize,
    pub atr_multiplier: f64,
    pub flow_period: usize,
    pub source: FlowSource,
}

impl Default for FlowTrendParams {
    fn default() -> Self {
        Self {
            atr_period: 14,
            atr_multiplier: 1.0,
            flow_period: 14,
            source: FlowSource::Mfi,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwingParams {
    pub swing_length: usize,
}

impl Default for SwingParams {
    fn default() -> Self {
        Self { swing_length: 10 }
    }
}

/// Order-block impulse detection and equal-level tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneParams {
    /// Number of preceding bars whose mean range an impulse is measured against.
    pub range_window: usize,
    /// A bar is impulsive when its range is at least this multiple of that mean.
    pub impulse_ratio: f64,
    /// Two swing levels of one kind are "equal" within this relative distance.
    pub equal_level_tolerance: f64,
}

impl Default for ZoneParams {
    fn default() -> Self {
        Self {
            range_window: 5,
            impulse_ratio: 1.5,
            equal_level_tolerance: 0.01,
        }
    }
}

/// Complete parameter set for one `(instrument, parameter-set)` context.
///
/// The structure-break machine has no parameters of its own; it reads the
/// swing detector configured by `swing`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub range: RangeParams,
    pub trend_band: TrendBandParams,
    pub flow_trend: FlowTrendParams,
    pub swing: SwingParams,
    pub zones: ZoneParams,
}

impl PipelineConfig {
    /// Parse from TOML. Missing sections and keys fall back to defaults.
    /// Parameter values are checked by [`PipelineConfig::validate`].
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check every parameter set by constructing its indicator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        crate::pipeline::Components::build(self).map(|_| ())
    }
}
