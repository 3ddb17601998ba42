//! Swing point detection with explicit confirmation latency.
//!
//! Bar `i` is a swing high when its high equals the maximum high over the
//! centered window `[i - L, i + L]` (ties count), and symmetrically for lows.
//! That window reaches `L` bars past the pivot, so a pivot at `i` is announced in
//! the step for bar `i + L` and never earlier. Snapshots expose only levels that
//! have been announced, forward-filled.
//!
//! Lookback: 2L (the first complete window ends at bar 2L).

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::{require_period, ConfigError, SwingParams};
use crate::domain::{Bar, SwingKind, SwingLevel};
use crate::indicator::Indicator;

#[derive(Debug, Clone, PartialEq)]
pub struct SwingDetector {
    length: usize,
    name: String,
}

impl SwingDetector {
    pub fn new(swing_length: usize) -> Result<Self, ConfigError> {
        let length = require_period("swing", "swing_length", swing_length)?;
        Ok(Self {
            length,
            name: format!("swing_{length}"),
        })
    }

    pub fn from_params(params: &SwingParams) -> Result<Self, ConfigError> {
        Self::new(params.swing_length)
    }

    pub fn swing_length(&self) -> usize {
        self.length
    }

    fn window(&self) -> usize {
        2 * self.length + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwingState {
    /// `(high, low)` of the most recent `2L + 1` bars.
    window: VecDeque<(f64, f64)>,
    bars_seen: usize,
    last_high: Option<SwingLevel>,
    last_low: Option<SwingLevel>,
    history: Vec<SwingLevel>,
}

impl SwingState {
    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    /// Every announced level, in announcement order.
    pub fn history(&self) -> &[SwingLevel] {
        &self.history
    }

    pub fn last(&self, kind: SwingKind) -> Option<SwingLevel> {
        match kind {
            SwingKind::High => self.last_high,
            SwingKind::Low => self.last_low,
        }
    }

    /// The last `n` announced levels of `kind`, oldest first.
    pub fn recent(&self, kind: SwingKind, n: usize) -> Vec<SwingLevel> {
        let mut levels: Vec<SwingLevel> = self
            .history
            .iter()
            .rev()
            .filter(|l| l.kind == kind)
            .take(n)
            .copied()
            .collect();
        levels.reverse();
        levels
    }
}

/// What is known about swings as of one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingSnapshot {
    /// Most recent swing high announced at or before this bar.
    pub last_high: Option<SwingLevel>,
    /// Most recent swing low announced at or before this bar.
    pub last_low: Option<SwingLevel>,
    /// Swing high announced on exactly this bar.
    pub new_high: Option<SwingLevel>,
    /// Swing low announced on exactly this bar.
    pub new_low: Option<SwingLevel>,
}

impl SwingSnapshot {
    pub fn high_price(&self) -> Option<f64> {
        self.last_high.map(|l| l.price)
    }

    pub fn low_price(&self) -> Option<f64> {
        self.last_low.map(|l| l.price)
    }
}

impl Indicator for SwingDetector {
    type State = SwingState;
    type Output = SwingSnapshot;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        2 * self.length
    }

    fn initial_state(&self) -> SwingState {
        SwingState {
            window: VecDeque::with_capacity(self.window()),
            bars_seen: 0,
            last_high: None,
            last_low: None,
            history: Vec::new(),
        }
    }

    fn step(&self, state: &mut SwingState, bar: &Bar) -> Option<SwingSnapshot> {
        let current = state.bars_seen;
        state.bars_seen += 1;
        state.window.push_back((bar.high, bar.low));
        if state.window.len() > self.window() {
            state.window.pop_front();
        }
        if state.window.len() < self.window() {
            return None;
        }

        let pivot_index = current - self.length;
        let (pivot_high, pivot_low) = state.window[self.length];
        let is_high = state.window.iter().all(|&(h, _)| h <= pivot_high);
        let is_low = state.window.iter().all(|&(_, l)| l >= pivot_low);

        let mut snapshot = SwingSnapshot {
            last_high: None,
            last_low: None,
            new_high: None,
            new_low: None,
        };
        if is_high {
            let level = SwingLevel {
                price: pivot_high,
                index: pivot_index,
                confirmed_at: current,
                kind: SwingKind::High,
            };
            state.history.push(level);
            state.last_high = Some(level);
            snapshot.new_high = Some(level);
        }
        if is_low {
            let level = SwingLevel {
                price: pivot_low,
                index: pivot_index,
                confirmed_at: current,
                kind: SwingKind::Low,
            };
            state.history.push(level);
            state.last_low = Some(level);
            snapshot.new_low = Some(level);
        }
        snapshot.last_high = state.last_high;
        snapshot.last_low = state.last_low;
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::hl_bars;

    #[test]
    fn pivot_is_announced_length_bars_later() {
        let bars = hl_bars(&[
            (1.0, 0.5),
            (2.0, 1.5),
            (5.0, 4.0), // pivot high at 2
            (2.0, 1.0),
            (1.5, 0.2), // pivot low at 4 needs bars 5 and 6
            (3.0, 2.0),
            (3.5, 2.5),
        ]);
        let det = SwingDetector::new(2).unwrap();
        let out = det.compute(&bars);

        assert!(out[..4].iter().all(Option::is_none));
        let at4 = out[4].unwrap();
        let high = at4.new_high.expect("pivot high announced at bar 4");
        assert_eq!(high.price, 5.0);
        assert_eq!(high.index, 2);
        assert_eq!(high.confirmed_at, 4);
        assert_eq!(at4.last_low, None);

        let at5 = out[5].unwrap();
        assert_eq!(at5.new_high, None);
        assert_eq!(at5.high_price(), Some(5.0));
        assert_eq!(at5.low_price(), None);

        let at6 = out[6].unwrap();
        let low = at6.new_low.expect("pivot low announced at bar 6");
        assert_eq!((low.price, low.index, low.confirmed_at), (0.2, 4, 6));
    }

    #[test]
    fn ties_with_window_max_count() {
        let bars = hl_bars(&[(1.0, 0.0), (3.0, 2.0), (3.0, 2.0), (1.0, 0.0), (1.0, 0.0)]);
        let det = SwingDetector::new(1).unwrap();
        let out = det.compute(&bars);
        assert_eq!(out[2].unwrap().new_high.map(|l| l.index), Some(1));
        assert_eq!(out[3].unwrap().new_high.map(|l| l.index), Some(2));
    }

    #[test]
    fn bar_can_be_both_high_and_low_in_flat_window() {
        let bars = hl_bars(&[(2.0, 1.0); 3]);
        let det = SwingDetector::new(1).unwrap();
        let snap = det.compute(&bars)[2].unwrap();
        assert!(snap.new_high.is_some());
        assert!(snap.new_low.is_some());
    }

    #[test]
    fn history_and_recent_levels() {
        let highs = [1.0, 4.0, 1.0, 5.0, 1.0, 6.0, 1.0, 7.0, 1.0];
        let data: Vec<(f64, f64)> = highs.iter().map(|&h| (h, 0.5)).collect();
        let det = SwingDetector::new(1).unwrap();
        let mut state = det.initial_state();
        for bar in &hl_bars(&data) {
            det.step(&mut state, bar);
        }
        let recent = state.recent(SwingKind::High, 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].price, 6.0);
        assert_eq!(recent[1].price, 7.0);
        assert_eq!(state.recent(SwingKind::High, 10).len(), 4);
        assert_eq!(state.last(SwingKind::High).map(|l| l.price), Some(7.0));
        assert!(state
            .history()
            .windows(2)
            .all(|w| w[0].confirmed_at <= w[1].confirmed_at));
    }

    #[test]
    fn rejects_zero_length() {
        assert!(SwingDetector::new(0).is_err());
    }

    #[test]
    fn lookback_is_twice_length() {
        assert_eq!(SwingDetector::new(10).unwrap().lookback(), 20);
    }
}
