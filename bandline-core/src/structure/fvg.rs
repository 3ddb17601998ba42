//! Fair value gaps: three-bar price imbalances.
//!
//! A bullish gap exists when bar `i`'s low is above bar `i - 2`'s high, leaving
//! the middle bar's range partly untraded. Bearish is the mirror image. The gap
//! belongs to the middle bar `i - 1` but is only known once bar `i` closes, so it
//! is announced in the step for bar `i`.
//!
//! Lookback: 2.

use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Direction};
use crate::indicator::Indicator;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FairValueGap {
    pub direction: Direction,
    pub top: f64,
    pub bottom: f64,
    /// The middle bar of the three.
    pub index: usize,
    pub confirmed_at: usize,
}

/// Gap announced on one bar, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GapScan {
    pub gap: Option<FairValueGap>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FairValueGaps;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FvgState {
    /// `(high, low)` of bars `i - 2` and `i - 1`.
    recent: [Option<(f64, f64)>; 2],
    bars_seen: usize,
}

impl Indicator for FairValueGaps {
    type State = FvgState;
    type Output = GapScan;

    fn name(&self) -> &str {
        "fvg"
    }

    fn lookback(&self) -> usize {
        2
    }

    fn initial_state(&self) -> FvgState {
        FvgState::default()
    }

    fn step(&self, state: &mut FvgState, bar: &Bar) -> Option<GapScan> {
        let index = state.bars_seen;
        state.bars_seen += 1;
        let [first, middle] = state.recent;
        state.recent = [middle, Some((bar.high, bar.low))];

        let (first_high, first_low) = first?;
        let gap = if bar.low > first_high {
            Some(FairValueGap {
                direction: Direction::Bullish,
                top: bar.low,
                bottom: first_high,
                index: index - 1,
                confirmed_at: index,
            })
        } else if bar.high < first_low {
            Some(FairValueGap {
                direction: Direction::Bearish,
                top: first_low,
                bottom: bar.high,
                index: index - 1,
                confirmed_at: index,
            })
        } else {
            None
        };
        Some(GapScan { gap })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::hl_bars;

    #[test]
    fn bullish_gap_spans_first_high_to_third_low() {
        let bars = hl_bars(&[(10.0, 9.0), (13.0, 10.5), (14.0, 11.0), (14.5, 13.5)]);
        let out = FairValueGaps.compute(&bars);
        assert_eq!(out[..2], [None, None]);

        let gap = out[2].unwrap().gap.unwrap();
        assert_eq!(gap.direction, Direction::Bullish);
        assert_eq!((gap.bottom, gap.top), (10.0, 11.0));
        assert_eq!((gap.index, gap.confirmed_at), (1, 2));

        // 13.5 > 13.0: bars 1..3 leave a second gap
        let next = out[3].unwrap().gap.unwrap();
        assert_eq!((next.bottom, next.top, next.index), (13.0, 13.5, 2));
    }

    #[test]
    fn bearish_gap() {
        let bars = hl_bars(&[(20.0, 18.0), (18.5, 15.0), (16.0, 14.0)]);
        let gap = FairValueGaps.compute(&bars)[2].unwrap().gap.unwrap();
        assert_eq!(gap.direction, Direction::Bearish);
        assert_eq!((gap.bottom, gap.top), (16.0, 18.0));
    }

    #[test]
    fn touching_ranges_are_not_a_gap() {
        let bars = hl_bars(&[(10.0, 9.0), (12.0, 9.5), (12.5, 10.0)]);
        assert_eq!(FairValueGaps.compute(&bars)[2], Some(GapScan { gap: None }));
    }
}
