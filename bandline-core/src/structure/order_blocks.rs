//! Order blocks: the last opposite-colored bar before an impulsive move.
//!
//! Bar `i` is impulsive when its range is at least `impulse_ratio` times the
//! mean range of the `range_window` bars before it. A bullish impulse (close
//! above open) preceded by a bearish bar marks that bar as a bullish block;
//! a bearish impulse after a bullish bar marks a bearish block. The block is
//! bar `i - 1`, announced in the step for bar `i`.
//!
//! Lookback: `range_window`.

use serde::{Deserialize, Serialize};

use crate::config::{require_period, require_positive, ConfigError, ZoneParams};
use crate::domain::{Bar, Direction};
use crate::indicator::Indicator;
use crate::indicators::RollingSum;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    pub direction: Direction,
    pub top: f64,
    pub bottom: f64,
    pub volume: f64,
    pub index: usize,
    pub confirmed_at: usize,
}

/// Block announced on one bar, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockScan {
    pub block: Option<OrderBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBlocks {
    range_window: usize,
    impulse_ratio: f64,
    name: String,
}

impl OrderBlocks {
    pub fn new(range_window: usize, impulse_ratio: f64) -> Result<Self, ConfigError> {
        let range_window = require_period("order_blocks", "range_window", range_window)?;
        let impulse_ratio = require_positive("order_blocks", "impulse_ratio", impulse_ratio)?;
        Ok(Self {
            range_window,
            impulse_ratio,
            name: format!("order_blocks_{range_window}_{impulse_ratio}"),
        })
    }

    pub fn from_params(params: &ZoneParams) -> Result<Self, ConfigError> {
        Self::new(params.range_window, params.impulse_ratio)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBlockState {
    /// Ranges of the bars before the current one.
    ranges: RollingSum,
    prev: Option<Bar>,
    bars_seen: usize,
}

impl Indicator for OrderBlocks {
    type State = OrderBlockState;
    type Output = BlockScan;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.range_window
    }

    fn initial_state(&self) -> OrderBlockState {
        OrderBlockState {
            ranges: RollingSum::new(self.range_window),
            prev: None,
            bars_seen: 0,
        }
    }

    fn step(&self, state: &mut OrderBlockState, bar: &Bar) -> Option<BlockScan> {
        let index = state.bars_seen;
        state.bars_seen += 1;
        let mean_range = state.ranges.mean();
        let prev = state.prev.replace(bar.clone());
        let range = bar.high - bar.low;
        state.ranges.push(range);

        let (mean_range, prev) = (mean_range?, prev?);
        if range < mean_range * self.impulse_ratio {
            return Some(BlockScan::default());
        }

        let direction = if bar.close > bar.open && prev.close < prev.open {
            Direction::Bullish
        } else if bar.close < bar.open && prev.close > prev.open {
            Direction::Bearish
        } else {
            return Some(BlockScan::default());
        };
        Some(BlockScan {
            block: Some(OrderBlock {
                direction,
                top: prev.high,
                bottom: prev.low,
                volume: prev.volume,
                index: index - 1,
                confirmed_at: index,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_bars;

    /// Five quiet bars with range 1, alternating color.
    fn quiet() -> Vec<(f64, f64, f64, f64)> {
        vec![
            (100.0, 100.5, 99.5, 100.2),
            (100.2, 100.6, 99.6, 99.9),
            (99.9, 100.4, 99.4, 100.1),
            (100.1, 100.5, 99.5, 99.8),
            (99.8, 100.3, 99.3, 100.0),
        ]
    }

    #[test]
    fn bullish_block_after_bearish_bar() {
        let mut data = quiet();
        data.push((100.0, 100.4, 99.4, 99.6)); // 5 bearish, range 1
        data.push((99.6, 102.0, 99.5, 101.8)); // 6 bullish, range 2.5 >= 1.5
        let bars = make_ohlc_bars(&data);
        let out = OrderBlocks::new(5, 1.5).unwrap().compute(&bars);

        assert!(out[..5].iter().all(Option::is_none));
        assert_eq!(out[5], Some(BlockScan::default()));
        let block = out[6].unwrap().block.unwrap();
        assert_eq!(block.direction, Direction::Bullish);
        assert_eq!((block.top, block.bottom), (100.4, 99.4));
        assert_eq!((block.index, block.confirmed_at), (5, 6));
        assert_eq!(block.volume, 1000.0);
    }

    #[test]
    fn bearish_block_after_bullish_bar() {
        let mut data = quiet();
        data.push((100.0, 100.6, 99.6, 100.4)); // 5 bullish
        data.push((100.4, 100.5, 97.5, 97.8)); // 6 bearish, range 3
        let out = OrderBlocks::new(5, 1.5).unwrap().compute(&make_ohlc_bars(&data));
        let block = out[6].unwrap().block.unwrap();
        assert_eq!(block.direction, Direction::Bearish);
        assert_eq!((block.top, block.bottom, block.index), (100.6, 99.6, 5));
    }

    #[test]
    fn small_move_or_same_color_is_not_a_block() {
        let mut data = quiet();
        data.push((100.0, 100.4, 99.4, 99.6)); // 5 bearish
        data.push((99.6, 100.8, 99.6, 100.6)); // 6 bullish, range 1.2 < 1.5
        data.push((100.6, 100.9, 100.0, 100.8)); // 7 bullish
        data.push((100.8, 104.0, 100.7, 103.9)); // 8 bullish impulse after bullish bar
        let out = OrderBlocks::new(5, 1.5).unwrap().compute(&make_ohlc_bars(&data));
        assert_eq!(out[6], Some(BlockScan::default()));
        assert_eq!(out[8], Some(BlockScan::default()));
    }

    #[test]
    fn rejects_bad_params() {
        assert!(OrderBlocks::new(0, 1.5).is_err());
        assert!(OrderBlocks::new(5, 0.0).is_err());
    }
}
