//! Structure-break state machine (BOS / CHoCH).
//!
//! Reads closes against the most recently confirmed swing high and low and keeps
//! a persistent trend. A close above the swing high is a bullish break, a close
//! below the swing low a bearish one; the high is tested first, so a close that
//! satisfies both (degenerate levels) resolves bullish. The break is a BOS when it
//! agrees with (or starts from neutral) the prevailing trend and a CHoCH when it
//! reverses it. Levels are not consumed: every close beyond a level emits.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::domain::{BreakKind, Direction, StructureEvent, Trend};

/// The state machine. It has no parameters; the swing detector feeding it does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructureBreaks;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakState {
    trend: Trend,
}

impl BreakState {
    /// State resuming from a known trend.
    pub fn new(trend: Trend) -> Self {
        Self { trend }
    }

    pub fn trend(&self) -> Trend {
        self.trend
    }
}

impl StructureBreaks {
    /// Advance by one bar.
    ///
    /// Until both a swing high and a swing low have been confirmed there is
    /// nothing to break: the trend is held and no event is emitted.
    pub fn step_levels(
        &self,
        state: &mut BreakState,
        index: usize,
        close: f64,
        swing_high: Option<f64>,
        swing_low: Option<f64>,
    ) -> Option<StructureEvent> {
        let (Some(high), Some(low)) = (swing_high, swing_low) else {
            return None;
        };

        let (kind, direction, trend) = if close > high {
            let kind = if state.trend != Trend::Down {
                BreakKind::Bos
            } else {
                BreakKind::Choch
            };
            (kind, Direction::Bullish, Trend::Up)
        } else if close < low {
            let kind = if state.trend != Trend::Up {
                BreakKind::Bos
            } else {
                BreakKind::Choch
            };
            (kind, Direction::Bearish, Trend::Down)
        } else {
            return None;
        };

        state.trend = trend;
        let event = StructureEvent {
            index,
            kind,
            direction,
        };
        trace!(%event, close, high, low, "structure break");
        Some(event)
    }
}
