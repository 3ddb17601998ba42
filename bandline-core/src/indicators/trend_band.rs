//! Trend band: ATR ratchet with a bullish/bearish direction flag.
//!
//! Inherently sequential/stateful. Each bar builds raw bands around hl2:
//!
//! ```text
//! raw_upper = hl2 + multiplier * ATR
//! raw_lower = hl2 - multiplier * ATR
//! ```
//!
//! The final upper band only moves down unless the previous close escaped above
//! it; the final lower band only moves up unless the previous close escaped below
//! it. Direction flips when the close crosses the *previous* bar's final band.
//!
//! Lookback: period - 1 (same as ATR). The first available bar has no prior
//! band and is seeded with the raw bands and [`SEED_DIRECTION`].

use serde::{Deserialize, Serialize};

use crate::config::{require_positive, ConfigError, TrendBandParams};
use crate::domain::{Bar, Direction};
use crate::indicator::Indicator;
use crate::indicators::atr::{Atr, AtrState};

/// Direction assigned to the first bar with an ATR value. There is no prior state
/// to derive it from; this is a fixed convention.
pub const SEED_DIRECTION: Direction = Direction::Bullish;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendBand {
    atr: Atr,
    multiplier: f64,
    name: String,
}

impl TrendBand {
    pub fn new(period: usize, multiplier: f64) -> Result<Self, ConfigError> {
        let atr = Atr::new(period)?;
        let multiplier = require_positive("trend_band", "multiplier", multiplier)?;
        Ok(Self {
            atr,
            multiplier,
            name: format!("trend_band_{period}_{multiplier}"),
        })
    }

    pub fn from_params(params: &TrendBandParams) -> Result<Self, ConfigError> {
        Self::new(params.period, params.multiplier)
    }

    pub fn period(&self) -> usize {
        self.atr.period()
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

/// Band state carried from one bar to the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandState {
    pub final_upper: f64,
    pub final_lower: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendBandState {
    atr: AtrState,
    band: Option<BandState>,
}

impl TrendBandState {
    /// Band after the most recent bar, if ATR was available.
    pub fn band(&self) -> Option<&BandState> {
        self.band.as_ref()
    }
}

/// Per-bar output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendBandOutput {
    /// Active band: final lower when bullish, final upper when bearish.
    pub line: f64,
    pub upper: f64,
    pub lower: f64,
    pub direction: Direction,
    /// Direction differs from the previous bar's. Never set on the seed bar.
    pub flipped: bool,
}

impl Indicator for TrendBand {
    type State = TrendBandState;
    type Output = TrendBandOutput;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.atr.lookback()
    }

    fn initial_state(&self) -> TrendBandState {
        TrendBandState {
            atr: self.atr.initial_state(),
            band: None,
        }
    }

    fn step(&self, state: &mut TrendBandState, bar: &Bar) -> Option<TrendBandOutput> {
        // Read before the ATR step overwrites it with this bar's close.
        let prev_close = state.atr.prev_close();
        let atr = self.atr.step(&mut state.atr, bar)?;

        let basis = bar.hl2();
        let raw_upper = basis + self.multiplier * atr;
        let raw_lower = basis - self.multiplier * atr;

        let (next, flipped) = match (state.band, prev_close) {
            (Some(prev), Some(prev_close)) => {
                let final_upper = if raw_upper < prev.final_upper || prev_close > prev.final_upper {
                    raw_upper
                } else {
                    prev.final_upper
                };
                let final_lower = if raw_lower > prev.final_lower || prev_close < prev.final_lower {
                    raw_lower
                } else {
                    prev.final_lower
                };
                // Compare against the previous bar's bands, never this bar's.
                let direction = if bar.close > prev.final_upper {
                    Direction::Bullish
                } else if bar.close < prev.final_lower {
                    Direction::Bearish
                } else {
                    prev.direction
                };
                (
                    BandState {
                        final_upper,
                        final_lower,
                        direction,
                    },
                    direction != prev.direction,
                )
            }
            _ => (
                BandState {
                    final_upper: raw_upper,
                    final_lower: raw_lower,
                    direction: SEED_DIRECTION,
                },
                false,
            ),
        };
        state.band = Some(next);

        let line = match next.direction {
            Direction::Bullish => next.final_lower,
            Direction::Bearish => next.final_upper,
        };
        Some(TrendBandOutput {
            line,
            upper: next.final_upper,
            lower: next.final_lower,
            direction: next.direction,
            flipped,
        })
    }
}
