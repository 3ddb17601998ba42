//! Append-only bar sequence for one instrument and timeframe.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bar::Bar;
use super::ids::DatasetHash;

/// Reasons a bar is refused at append time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar at {timestamp} has NaN or non-finite fields or an inconsistent OHLC envelope")]
    Insane { timestamp: NaiveDateTime },

    #[error("bar at {timestamp} does not follow previous bar at {previous}")]
    OutOfOrder {
        timestamp: NaiveDateTime,
        previous: NaiveDateTime,
    },
}

/// Ordered bars for one `(instrument, timeframe)` pair.
///
/// Index `i` is position, not time. Timestamps are strictly increasing; gaps are
/// allowed and resolving them is the data collaborator's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedSeries")]
pub struct BarSeries {
    pub instrument: String,
    pub timeframe: String,
    bars: Vec<Bar>,
}

/// Wire form of [`BarSeries`]; deserialized bars are replayed through `push`.
#[derive(Deserialize)]
struct UncheckedSeries {
    instrument: String,
    timeframe: String,
    bars: Vec<Bar>,
}

impl TryFrom<UncheckedSeries> for BarSeries {
    type Error = BarError;

    fn try_from(raw: UncheckedSeries) -> Result<Self, BarError> {
        Self::from_bars(raw.instrument, raw.timeframe, raw.bars)
    }
}

impl BarSeries {
    pub fn new(instrument: impl Into<String>, timeframe: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            timeframe: timeframe.into(),
            bars: Vec::new(),
        }
    }

    /// Build a fixed series, validating every bar in order.
    pub fn from_bars(
        instrument: impl Into<String>,
        timeframe: impl Into<String>,
        bars: Vec<Bar>,
    ) -> Result<Self, BarError> {
        let mut series = Self::new(instrument, timeframe);
        series.bars.reserve(bars.len());
        for bar in bars {
            series.push(bar)?;
        }
        Ok(series)
    }

    /// Append a bar. The series is left unchanged when the bar is refused.
    pub fn push(&mut self, bar: Bar) -> Result<(), BarError> {
        if !bar.is_sane() {
            return Err(BarError::Insane {
                timestamp: bar.timestamp,
            });
        }
        if let Some(last) = self.bars.last() {
            if bar.timestamp <= last.timestamp {
                return Err(BarError::OutOfOrder {
                    timestamp: bar.timestamp,
                    previous: last.timestamp,
                });
            }
        }
        self.bars.push(bar);
        Ok(())
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Content hash of the bars (instrument and timeframe labels excluded).
    pub fn dataset_hash(&self) -> DatasetHash {
        DatasetHash::of_bars(&self.bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn bar_at(day: i64, close: f64) -> Bar {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::days(day);
        Bar::new(ts, close, close + 1.0, close - 1.0, close, 1000.0)
    }

    #[test]
    fn push_accepts_increasing_timestamps() {
        let mut series = BarSeries::new("BTC/USDT", "1h");
        series.push(bar_at(0, 100.0)).unwrap();
        series.push(bar_at(1, 101.0)).unwrap();
        series.push(bar_at(5, 99.0)).unwrap(); // gap is fine
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn push_rejects_duplicate_timestamp() {
        let mut series = BarSeries::new("BTC/USDT", "1h");
        series.push(bar_at(3, 100.0)).unwrap();
        let err = series.push(bar_at(3, 101.0)).unwrap_err();
        assert!(matches!(err, BarError::OutOfOrder { .. }));
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn push_rejects_earlier_timestamp() {
        let mut series = BarSeries::new("BTC/USDT", "1h");
        series.push(bar_at(3, 100.0)).unwrap();
        assert!(series.push(bar_at(2, 100.0)).is_err());
    }

    #[test]
    fn push_rejects_void_bar() {
        let mut series = BarSeries::new("BTC/USDT", "1h");
        let mut bar = bar_at(0, 100.0);
        bar.close = f64::NAN;
        let err = series.push(bar).unwrap_err();
        assert!(matches!(err, BarError::Insane { .. }));
        assert!(series.is_empty());
    }

    #[test]
    fn deserialize_round_trips_valid_series() {
        let series = BarSeries::from_bars("BTC/USDT", "1d", vec![bar_at(0, 100.0), bar_at(1, 101.0)]).unwrap();
        let json = serde_json::to_string(&series).unwrap();
        let back: BarSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(back, series);
    }

    #[test]
    fn deserialize_rejects_out_of_order_bars() {
        let mut series = BarSeries::new("BTC/USDT", "1d");
        series.push(bar_at(0, 100.0)).unwrap();
        series.push(bar_at(1, 101.0)).unwrap();
        let json = serde_json::to_string(&series).unwrap();
        let mut swapped: serde_json::Value = serde_json::from_str(&json).unwrap();
        swapped["bars"].as_array_mut().unwrap().swap(0, 1);
        let err = serde_json::from_value::<BarSeries>(swapped).unwrap_err();
        assert!(err.to_string().contains("does not follow"));
    }

    #[test]
    fn deserialize_rejects_insane_bar() {
        let json = serde_json::to_string(&BarSeries::from_bars("X", "1h", vec![bar_at(0, 100.0)]).unwrap()).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        // high below low
        value["bars"][0]["high"] = serde_json::json!(90.0);
        assert!(serde_json::from_value::<BarSeries>(value).is_err());
    }

    #[test]
    fn from_bars_stops_at_first_bad_bar() {
        let bars = vec![bar_at(0, 100.0), bar_at(2, 101.0), bar_at(1, 102.0)];
        assert!(BarSeries::from_bars("ETH/USDT", "4h", bars).is_err());
    }

    #[test]
    fn dataset_hash_ignores_labels() {
        let bars = vec![bar_at(0, 100.0), bar_at(1, 101.0)];
        let a = BarSeries::from_bars("A", "1h", bars.clone()).unwrap();
        let b = BarSeries::from_bars("B", "1d", bars).unwrap();
        assert_eq!(a.dataset_hash(), b.dataset_hash());
    }
}
