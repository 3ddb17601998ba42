//! Indicator trait and the live-stream wrapper.
//!
//! An indicator is an immutable, validated parameter set. Everything that changes
//! bar to bar lives in its `State`, which the caller owns (one per instrument and
//! parameter set) and threads through `step`. Batch evaluation is nothing more
//! than folding `step` over the bars, so batch and incremental results are
//! bit-identical by construction.

use crate::domain::Bar;

/// Trait for causal, incrementally evaluated indicators.
///
/// `step` receives bars strictly in order and returns the output for the bar it
/// was just given, or `None` while the indicator lacks history (warmup).
///
/// # Look-ahead contamination guard
/// No output at bar t may depend on bar t+1 or later. Every indicator must pass
/// the truncated-vs-full series test.
pub trait Indicator: Send + Sync {
    type State: Clone + Send + Sync;
    type Output: Clone + PartialEq + Send + Sync;

    /// Human-readable name (e.g., "atr_14", "trend_band_10_3").
    fn name(&self) -> &str;

    /// Index of the first bar that can carry a value.
    fn lookback(&self) -> usize;

    /// Fresh per-context state.
    fn initial_state(&self) -> Self::State;

    /// Advance `state` by one bar and return that bar's output.
    fn step(&self, state: &mut Self::State, bar: &Bar) -> Option<Self::Output>;

    /// Evaluate the whole slice from a fresh state.
    fn compute(&self, bars: &[Bar]) -> Vec<Option<Self::Output>> {
        let mut state = self.initial_state();
        bars.iter().map(|bar| self.step(&mut state, bar)).collect()
    }
}

/// An indicator bound to its own state, for live (append-only) evaluation.
#[derive(Debug, Clone)]
pub struct IndicatorStream<I: Indicator> {
    indicator: I,
    state: I::State,
    index: usize,
}

impl<I: Indicator> IndicatorStream<I> {
    pub fn new(indicator: I) -> Self {
        let state = indicator.initial_state();
        Self {
            indicator,
            state,
            index: 0,
        }
    }

    /// Feed the next bar.
    pub fn push(&mut self, bar: &Bar) -> Option<I::Output> {
        let out = self.indicator.step(&mut self.state, bar);
        self.index += 1;
        out
    }

    /// Number of bars consumed so far.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    pub fn state(&self) -> &I::State {
        &self.state
    }

    /// Drop all history (stream restart).
    pub fn reset(&mut self) {
        self.state = self.indicator.initial_state();
        self.index = 0;
    }
}
