//! Flow trend: ATR ratchet whose clamp direction is chosen by a flow oscillator.
//!
//! ```text
//! candidate_support    = low  - ATR * multiplier
//! candidate_resistance = high + ATR * multiplier
//! line = flow >= 50 ? max(candidate_resistance, line[-1])
//!                   : min(candidate_support,    line[-1])
//! ```
//!
//! While flow stays at or above the neutral midpoint the line can only rise; while
//! it stays below, the line can only fall. The first bar on which both ATR and
//! flow are available has no previous line and is seeded at that bar's close;
//! the ratchet starts clamping from the next bar.
//!
//! Direction is derived from the line itself against a two-bar lagged signal:
//! `signal = line[-2]`, bullish when `line > signal`.

use serde::{Deserialize, Serialize};

use crate::config::{require_positive, ConfigError, FlowTrendParams};
use crate::domain::{Bar, Cross, Direction};
use crate::indicator::Indicator;
use crate::indicators::atr::{Atr, AtrState};
use crate::indicators::flow::{FlowOscillator, FlowState, NEUTRAL};

/// Lag between the line and its signal line.
pub const SIGNAL_LAG: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct FlowTrend {
    atr: Atr,
    flow: FlowOscillator,
    multiplier: f64,
    name: String,
}

impl FlowTrend {
    pub fn new(params: FlowTrendParams) -> Result<Self, ConfigError> {
        let atr = Atr::new(params.atr_period)?;
        let multiplier = require_positive("flow_trend", "atr_multiplier", params.atr_multiplier)?;
        let flow = FlowOscillator::new(params.source, params.flow_period)?;
        let name = format!(
            "flow_trend_{}_{}_{}",
            flow.name(),
            params.atr_period,
            multiplier
        );
        Ok(Self {
            atr,
            flow,
            multiplier,
            name,
        })
    }

    pub fn params(&self) -> FlowTrendParams {
        FlowTrendParams {
            atr_period: self.atr.period(),
            atr_multiplier: self.multiplier,
            flow_period: self.flow.period(),
            source: self.flow.source(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowTrendState {
    atr: AtrState,
    flow: FlowState,
    /// Lines of the last three bars, most recent first.
    recent: [Option<f64>; SIGNAL_LAG + 1],
}

impl FlowTrendState {
    /// Line of the most recent bar.
    pub fn last_line(&self) -> Option<f64> {
        self.recent[0]
    }
}

/// Per-bar output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowTrendOutput {
    pub flow: f64,
    pub line: f64,
    /// Line two bars back; `None` for the first two available bars.
    pub signal: Option<f64>,
    pub direction: Option<Direction>,
    /// Line crossed its signal on this bar.
    pub cross: Option<Cross>,
}

impl Indicator for FlowTrend {
    type State = FlowTrendState;
    type Output = FlowTrendOutput;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.atr.lookback().max(self.flow.lookback())
    }

    fn initial_state(&self) -> FlowTrendState {
        FlowTrendState {
            atr: self.atr.initial_state(),
            flow: self.flow.initial_state(),
            recent: [None; SIGNAL_LAG + 1],
        }
    }

    fn step(&self, state: &mut FlowTrendState, bar: &Bar) -> Option<FlowTrendOutput> {
        // Both inputs advance on every bar, available or not.
        let atr = self.atr.step(&mut state.atr, bar);
        let flow = self.flow.step(&mut state.flow, bar);
        let (Some(atr), Some(flow)) = (atr, flow) else {
            state.recent.rotate_right(1);
            state.recent[0] = None;
            return None;
        };

        let bullish_flow = flow >= NEUTRAL;
        let candidate = if bullish_flow {
            bar.high + atr * self.multiplier
        } else {
            bar.low - atr * self.multiplier
        };
        let line = match state.recent[0] {
            Some(prev) if bullish_flow => candidate.max(prev),
            Some(prev) => candidate.min(prev),
            None => bar.close,
        };

        let [prev_line, prev_prev_line, prev_signal] = state.recent;
        let signal = prev_prev_line;
        let direction = signal.map(|s| {
            if line > s {
                Direction::Bullish
            } else {
                Direction::Bearish
            }
        });
        let cross = match (signal, prev_line, prev_signal) {
            (Some(s), Some(pl), Some(ps)) if line > s && pl <= ps => Some(Cross::Up),
            (Some(s), Some(pl), Some(ps)) if line < s && pl >= ps => Some(Cross::Down),
            _ => None,
        };

        state.recent = [Some(line), prev_line, prev_prev_line];
        Some(FlowTrendOutput {
            flow,
            line,
            signal,
            direction,
            cross,
        })
    }
}
