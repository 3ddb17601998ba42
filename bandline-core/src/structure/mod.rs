//! Market structure: swing detection feeding the BOS/CHoCH state machine.
//!
//! [`MarketStructure`] chains the two as one `Indicator` over bars. The state
//! machine only ever sees swing levels that the detector has already announced,
//! so a pivot at bar `i` cannot influence any break before bar `i + L`.
//!
//! Zone detectors sit alongside: fair value gaps and order blocks read bars
//! directly, and liquidity zones pair up announced swing levels. Each zone is
//! announced on the bar that completes it, never written back to earlier bars.

pub mod breaks;
pub mod fvg;
pub mod liquidity;
pub mod order_blocks;
pub mod swing;

pub use breaks::{BreakState, StructureBreaks};
pub use fvg::{FairValueGap, FairValueGaps, FvgState, GapScan};
pub use liquidity::{LiquidityScan, LiquidityZone, LiquidityZones};
pub use order_blocks::{BlockScan, OrderBlock, OrderBlockState, OrderBlocks};
pub use swing::{SwingDetector, SwingSnapshot, SwingState};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SwingParams};
use crate::domain::{Bar, StructureEvent, Trend};
use crate::indicator::Indicator;

#[derive(Debug, Clone, PartialEq)]
pub struct MarketStructure {
    swings: SwingDetector,
    breaks: StructureBreaks,
    name: String,
}

impl MarketStructure {
    pub fn new(swing_length: usize) -> Result<Self, ConfigError> {
        let swings = SwingDetector::new(swing_length)?;
        let name = format!("structure_{swing_length}");
        Ok(Self {
            swings,
            breaks: StructureBreaks,
            name,
        })
    }

    pub fn from_params(params: &SwingParams) -> Result<Self, ConfigError> {
        Self::new(params.swing_length)
    }

    pub fn swing_detector(&self) -> &SwingDetector {
        &self.swings
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketStructureState {
    swings: SwingState,
    breaks: BreakState,
}

impl MarketStructureState {
    pub fn swings(&self) -> &SwingState {
        &self.swings
    }

    pub fn trend(&self) -> Trend {
        self.breaks.trend()
    }
}

/// Per-bar output, available once both a swing high and a swing low exist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructureOutput {
    pub trend: Trend,
    pub swing_high: f64,
    pub swing_low: f64,
    pub event: Option<StructureEvent>,
}

impl Indicator for MarketStructure {
    type State = MarketStructureState;
    type Output = StructureOutput;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.swings.lookback()
    }

    fn initial_state(&self) -> MarketStructureState {
        MarketStructureState {
            swings: self.swings.initial_state(),
            breaks: BreakState::default(),
        }
    }

    fn step(&self, state: &mut MarketStructureState, bar: &Bar) -> Option<StructureOutput> {
        self.step_with_swings(state, bar).1
    }
}

impl MarketStructure {
    /// Advance one bar, returning the detector's snapshot alongside the
    /// structure output so callers can keep both columns.
    pub fn step_with_swings(
        &self,
        state: &mut MarketStructureState,
        bar: &Bar,
    ) -> (Option<SwingSnapshot>, Option<StructureOutput>) {
        let Some(snapshot) = self.swings.step(&mut state.swings, bar) else {
            return (None, None);
        };
        let index = state.swings.bars_seen() - 1;
        let (Some(swing_high), Some(swing_low)) = (snapshot.high_price(), snapshot.low_price())
        else {
            return (Some(snapshot), None);
        };
        let event = self.breaks.step_levels(
            &mut state.breaks,
            index,
            bar.close,
            Some(swing_high),
            Some(swing_low),
        );
        let output = StructureOutput {
            trend: state.breaks.trend(),
            swing_high,
            swing_low,
            event,
        };
        (Some(snapshot), Some(output))
    }
}

/// Bars from `(high, low)` pairs with open = close = midpoint, volume = 1000.
#[cfg(test)]
pub(crate) fn hl_bars(data: &[(f64, f64)]) -> Vec<Bar> {
    let ohlc: Vec<(f64, f64, f64, f64)> = data
        .iter()
        .map(|&(h, l)| {
            let mid = (h + l) / 2.0;
            (mid, h, l, mid)
        })
        .collect();
    crate::indicators::make_ohlc_bars(&ohlc)
}
