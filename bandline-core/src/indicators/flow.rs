//! Bounded flow oscillators (0..=100, 50 neutral) used to gate the flow trend.
//!
//! - MFI: typical price `hlc3`, raw money flow `hlc3 * volume`. A bar's flow is
//!   positive when its typical price rose, negative when it fell, neither when
//!   unchanged or on the first bar.
//! - RSI (simple-mean variant): close-to-close gains and losses; the first bar
//!   contributes nothing.
//!
//! Both reduce to `100 - 100 / (1 + up / down)` over rolling sums of `period`
//! bars. A zero `down` sum resolves to the neutral 50 instead of dividing.
//! Lookback: period - 1.

use serde::{Deserialize, Serialize};

use crate::config::{require_period, ConfigError};
use crate::domain::Bar;
use crate::indicator::Indicator;
use crate::indicators::window::RollingSum;

/// Neutral midpoint of every flow oscillator.
pub const NEUTRAL: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowSource {
    /// Money Flow Index (volume weighted).
    #[default]
    Mfi,
    /// Relative Strength Index over simple means.
    Rsi,
}

/// `100 - 100 / (1 + up / down)`, or [`NEUTRAL`] when `down` is zero.
pub fn bounded_ratio(up: f64, down: f64) -> f64 {
    if down == 0.0 {
        return NEUTRAL;
    }
    100.0 - 100.0 / (1.0 + up / down)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowOscillator {
    source: FlowSource,
    period: usize,
    name: String,
}

impl FlowOscillator {
    pub fn new(source: FlowSource, period: usize) -> Result<Self, ConfigError> {
        let period = require_period("flow", "flow_period", period)?;
        let prefix = match source {
            FlowSource::Mfi => "mfi",
            FlowSource::Rsi => "rsi",
        };
        Ok(Self {
            source,
            period,
            name: format!("{prefix}_{period}"),
        })
    }

    pub fn mfi(period: usize) -> Result<Self, ConfigError> {
        Self::new(FlowSource::Mfi, period)
    }

    pub fn rsi(period: usize) -> Result<Self, ConfigError> {
        Self::new(FlowSource::Rsi, period)
    }

    pub fn source(&self) -> FlowSource {
        self.source
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Price compared bar over bar to classify each bar as up or down.
    fn reference(&self, bar: &Bar) -> f64 {
        match self.source {
            FlowSource::Mfi => bar.hlc3(),
            FlowSource::Rsi => bar.close,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowState {
    up: RollingSum,
    down: RollingSum,
    prev_reference: Option<f64>,
}

impl Indicator for FlowOscillator {
    type State = FlowState;
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn initial_state(&self) -> FlowState {
        FlowState {
            up: RollingSum::new(self.period),
            down: RollingSum::new(self.period),
            prev_reference: None,
        }
    }

    fn step(&self, state: &mut FlowState, bar: &Bar) -> Option<f64> {
        let reference = self.reference(bar);
        let (up, down) = match state.prev_reference {
            Some(prev) => match self.source {
                FlowSource::Mfi => {
                    let flow = reference * bar.volume;
                    if reference > prev {
                        (flow, 0.0)
                    } else if reference < prev {
                        (0.0, flow)
                    } else {
                        (0.0, 0.0)
                    }
                }
                FlowSource::Rsi => {
                    let change = reference - prev;
                    (change.max(0.0), (-change).max(0.0))
                }
            },
            None => (0.0, 0.0),
        };
        state.prev_reference = Some(reference);
        state.up.push(up);
        state.down.push(down);

        let up = state.up.sum()?;
        let down = state.down.sum()?;
        Some(bounded_ratio(up, down))
    }
}
