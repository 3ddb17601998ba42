//! Shared bar generators for integration tests.

#![allow(dead_code)]

use bandline_core::domain::Bar;
use chrono::{Duration, NaiveDate, NaiveDateTime};

pub fn ts(i: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::hours(i as i64)
}

/// Generate N bars of synthetic OHLCV data with realistic variation.
pub fn make_test_bars(n: usize) -> Vec<Bar> {
    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0;

    for i in 0..n {
        // Deterministic pseudo-random walk using a simple LCG
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.05; // -5.0 to +5.0
        price += change;
        price = f64::max(price, 10.0); // floor at 10

        let open = price - 0.5;
        let close = price + 0.3;
        let high = open.max(close) + 2.0 + (seed % 7) as f64 * 0.3;
        let low = open.min(close) - 2.0 - (seed % 5) as f64 * 0.3;

        bars.push(Bar::new(
            ts(i),
            open,
            high,
            low,
            close,
            1000.0 + (seed % 900) as f64,
        ));
    }

    bars
}

/// Bars from `(open, high, low, close)` tuples, volume = 1000.
pub fn ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    data.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c))| Bar::new(ts(i), o, h, l, c, 1000.0))
        .collect()
}
