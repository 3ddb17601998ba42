//! Equal highs and lows: resting liquidity above and below clustered swings.
//!
//! When a swing level is announced, it is compared with the earlier levels of
//! the same kind. If one lies within `tolerance` (relative to the earlier
//! price), the pair forms a liquidity zone at their mean. The most recent such
//! earlier level is used. Zones inherit the swing detector's latency.

use serde::{Deserialize, Serialize};

use crate::config::{require_positive, ConfigError, SwingParams, ZoneParams};
use crate::domain::{Bar, SwingKind, SwingLevel};
use crate::indicator::Indicator;
use crate::structure::swing::{SwingDetector, SwingSnapshot, SwingState};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiquidityZone {
    /// `High` for equal highs (sell-side above price), `Low` for equal lows.
    pub kind: SwingKind,
    pub level: f64,
    pub first_index: usize,
    pub second_index: usize,
    pub confirmed_at: usize,
}

/// Zones announced on one bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquidityScan {
    pub equal_highs: Option<LiquidityZone>,
    pub equal_lows: Option<LiquidityZone>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiquidityZones {
    swings: SwingDetector,
    tolerance: f64,
    name: String,
}

impl LiquidityZones {
    pub fn new(swing_length: usize, tolerance: f64) -> Result<Self, ConfigError> {
        let swings = SwingDetector::new(swing_length)?;
        let tolerance = require_positive("liquidity", "equal_level_tolerance", tolerance)?;
        Ok(Self {
            swings,
            tolerance,
            name: format!("liquidity_{swing_length}_{tolerance}"),
        })
    }

    pub fn from_params(swing: &SwingParams, zones: &ZoneParams) -> Result<Self, ConfigError> {
        Self::new(swing.swing_length, zones.equal_level_tolerance)
    }

    /// Zones formed by the levels `snapshot` announces, given the full history
    /// (which already contains them).
    pub fn scan(&self, history: &[SwingLevel], snapshot: &SwingSnapshot) -> LiquidityScan {
        LiquidityScan {
            equal_highs: snapshot.new_high.and_then(|l| self.pair(history, l)),
            equal_lows: snapshot.new_low.and_then(|l| self.pair(history, l)),
        }
    }

    fn pair(&self, history: &[SwingLevel], new: SwingLevel) -> Option<LiquidityZone> {
        let earlier = history
            .iter()
            .rev()
            .filter(|l| l.kind == new.kind && l.index < new.index)
            .find(|l| (l.price - new.price).abs() < self.tolerance * l.price.abs())?;
        Some(LiquidityZone {
            kind: new.kind,
            level: (earlier.price + new.price) / 2.0,
            first_index: earlier.index,
            second_index: new.index,
            confirmed_at: new.confirmed_at,
        })
    }
}

impl Indicator for LiquidityZones {
    type State = SwingState;
    type Output = LiquidityScan;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.swings.lookback()
    }

    fn initial_state(&self) -> SwingState {
        self.swings.initial_state()
    }

    fn step(&self, state: &mut SwingState, bar: &Bar) -> Option<LiquidityScan> {
        let snapshot = self.swings.step(state, bar)?;
        Some(self.scan(state.history(), &snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::hl_bars;

    #[test]
    fn equal_highs_pair_with_latest_match() {
        // L = 1. Highs at bars 1, 3, 5: 110.0, 110.5, 110.3.
        let bars = hl_bars(&[
            (100.0, 98.0),
            (110.0, 99.0),
            (105.0, 97.0),
            (110.5, 99.5),
            (104.0, 96.0),
            (110.3, 99.0),
            (103.0, 95.0),
        ]);
        let lz = LiquidityZones::new(1, 0.01).unwrap();
        let out = lz.compute(&bars);

        let first = out[4].unwrap().equal_highs.unwrap();
        assert_eq!((first.first_index, first.second_index), (1, 3));
        assert_eq!(first.level, 110.25);
        assert_eq!(first.confirmed_at, 4);

        let second = out[6].unwrap().equal_highs.unwrap();
        assert_eq!((second.first_index, second.second_index), (3, 5));
        assert_eq!(second.kind, SwingKind::High);
    }

    #[test]
    fn distant_levels_do_not_pair() {
        let bars = hl_bars(&[(100.0, 98.0), (110.0, 99.0), (105.0, 97.0), (120.0, 99.5), (104.0, 96.0)]);
        let out = LiquidityZones::new(1, 0.01).unwrap().compute(&bars);
        assert!(out.iter().flatten().all(|s| s.equal_highs.is_none()));
    }

    #[test]
    fn equal_lows() {
        let bars = hl_bars(&[(100.0, 95.0), (99.0, 90.0), (101.0, 94.0), (99.5, 90.2), (102.0, 93.0)]);
        let out = LiquidityZones::new(1, 0.005).unwrap().compute(&bars);
        let zone = out[4].unwrap().equal_lows.unwrap();
        assert_eq!((zone.first_index, zone.second_index), (1, 3));
        assert!((zone.level - 90.1).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_params() {
        assert!(LiquidityZones::new(0, 0.01).is_err());
        assert!(LiquidityZones::new(3, 0.0).is_err());
    }
}
