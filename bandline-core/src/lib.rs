//! Bandline Core: causal indicator and market-structure engine.
//!
//! This crate computes derived signals from ordered bar sequences:
//! - Domain types (bars, append-only series, directions, swing levels, structure events)
//! - Incremental `Indicator` trait: validated parameters + caller-owned state
//! - Range engine (true range, simple-mean ATR)
//! - Trend band (ATR ratchet with direction flag)
//! - Flow oscillators (MFI / RSI) and the flow-gated ratchet
//! - Swing detection with confirmation latency and the BOS/CHoCH state machine
//! - Fair value gaps, order blocks, and equal-high/low liquidity zones
//! - Per-context pipeline with bit-identical batch and live evaluation
//!
//! Output slots are `Option<T>`: `None` marks warmup or insufficient history and is
//! never replaced by a zero or NaN stand-in.

pub mod config;
pub mod domain;
pub mod indicator;
pub mod indicators;
pub mod pipeline;
pub mod structure;

pub use config::{ConfigError, PipelineConfig};
pub use indicator::{Indicator, IndicatorStream};
pub use pipeline::{evaluate, Pipeline, PipelineOutput, PipelineRow};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: per-context state and outputs are Send + Sync, so hosts
    /// can evaluate independent contexts on separate threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::BarSeries>();
        require_sync::<domain::BarSeries>();
        require_send::<domain::StructureEvent>();
        require_sync::<domain::StructureEvent>();
        require_send::<domain::SwingLevel>();
        require_sync::<domain::SwingLevel>();

        // Indicators and their state
        require_send::<indicators::TrendBand>();
        require_sync::<indicators::TrendBandState>();
        require_send::<indicators::FlowTrend>();
        require_sync::<indicators::FlowTrendState>();
        require_send::<structure::MarketStructure>();
        require_sync::<structure::MarketStructureState>();
        require_send::<structure::OrderBlocks>();
        require_sync::<structure::OrderBlockState>();
        require_send::<structure::LiquidityZones>();
        require_sync::<structure::FvgState>();

        // Pipeline
        require_send::<Pipeline>();
        require_sync::<Pipeline>();
        require_send::<PipelineOutput>();
        require_sync::<PipelineOutput>();
    }

    /// Compile-time check: `Indicator::step` sees exactly one bar.
    ///
    /// The signature takes `&Bar`, not a slice, so no implementation can read
    /// ahead of the bar it is given. This stops compiling if that changes.
    #[allow(dead_code)]
    fn step_takes_a_single_bar<I: Indicator>(
        ind: &I,
        state: &mut I::State,
        bar: &domain::Bar,
    ) -> Option<I::Output> {
        ind.step(state, bar)
    }
}
