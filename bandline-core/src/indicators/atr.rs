//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! TR[0] has no previous close and is just high-low.
//! ATR is the simple rolling mean of TR over `period` bars.
//! Lookback: period - 1 (first value at index period-1, TR[0] included).

use crate::config::{require_period, ConfigError, RangeParams};
use crate::domain::Bar;
use crate::indicator::Indicator;
use crate::indicators::window::RollingSum;

#[derive(Debug, Clone, PartialEq)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Result<Self, ConfigError> {
        let period = require_period("atr", "period", period)?;
        Ok(Self {
            period,
            name: format!("atr_{period}"),
        })
    }

    pub fn from_params(params: &RangeParams) -> Result<Self, ConfigError> {
        Self::new(params.period)
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// True range of `bar` given the previous bar's close, if any.
pub fn true_range(bar: &Bar, prev_close: Option<f64>) -> f64 {
    let hl = bar.high - bar.low;
    match prev_close {
        Some(pc) => hl.max((bar.high - pc).abs()).max((bar.low - pc).abs()),
        None => hl,
    }
}

/// Running state for one ATR context.
#[derive(Debug, Clone, PartialEq)]
pub struct AtrState {
    tr: RollingSum,
    prev_close: Option<f64>,
}

impl AtrState {
    /// Close of the most recent bar consumed.
    pub fn prev_close(&self) -> Option<f64> {
        self.prev_close
    }
}

impl Indicator for Atr {
    type State = AtrState;
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn initial_state(&self) -> AtrState {
        AtrState {
            tr: RollingSum::new(self.period),
            prev_close: None,
        }
    }

    fn step(&self, state: &mut AtrState, bar: &Bar) -> Option<f64> {
        state.tr.push(true_range(bar, state.prev_close));
        state.prev_close = Some(bar.close);
        state.tr.mean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars, DEFAULT_EPSILON};

    #[test]
    fn true_range_basic() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 105-95 = 10
            (102.0, 108.0, 100.0, 106.0), // TR = max(8, |108-102|, |100-102|) = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = max(9, |107-106|, |98-106|) = 9
        ]);
        assert_approx(true_range(&bars[0], None), 10.0, DEFAULT_EPSILON);
        assert_approx(true_range(&bars[1], Some(bars[0].close)), 8.0, DEFAULT_EPSILON);
        assert_approx(true_range(&bars[2], Some(bars[1].close)), 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        // Gap up: prev close 100, current bar 110-115-108
        let bars = make_ohlc_bars(&[
            (98.0, 102.0, 97.0, 100.0),
            (110.0, 115.0, 108.0, 112.0), // TR = max(7, |115-100|, |108-100|) = 15
        ]);
        assert_approx(true_range(&bars[1], Some(bars[0].close)), 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_3() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),  // TR = 10
            (102.0, 108.0, 100.0, 106.0), // TR = 8
            (106.0, 107.0, 98.0, 99.0),   // TR = 9
            (99.0, 103.0, 97.0, 101.0),   // TR = 6
            (101.0, 106.0, 100.0, 105.0), // TR = 6
        ]);
        let result = Atr::new(3).unwrap().compute(&bars);

        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        // ATR[2] = mean(10, 8, 9) = 9
        assert_approx(result[2].unwrap(), 9.0, DEFAULT_EPSILON);
        // ATR[3] = mean(8, 9, 6) = 23/3
        assert_approx(result[3].unwrap(), 23.0 / 3.0, DEFAULT_EPSILON);
        // ATR[4] = mean(9, 6, 6) = 7
        assert_approx(result[4].unwrap(), 7.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_1_is_true_range() {
        let bars = make_ohlc_bars(&[(100.0, 105.0, 95.0, 102.0), (110.0, 115.0, 108.0, 112.0)]);
        let result = Atr::new(1).unwrap().compute(&bars);
        assert_approx(result[0].unwrap(), 10.0, DEFAULT_EPSILON);
        assert_approx(result[1].unwrap(), 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_warmup_is_not_available() {
        let bars = make_ohlc_bars(&[(100.0, 101.0, 99.0, 100.0); 13]);
        let result = Atr::new(14).unwrap().compute(&bars);
        assert!(result.iter().all(Option::is_none));
    }

    #[test]
    fn atr_rejects_zero_period() {
        assert!(matches!(
            Atr::new(0),
            Err(ConfigError::PeriodTooSmall { indicator: "atr", .. })
        ));
    }

    #[test]
    fn atr_lookback() {
        assert_eq!(Atr::new(14).unwrap().lookback(), 13);
        assert_eq!(Atr::new(1).unwrap().lookback(), 0);
    }
}
