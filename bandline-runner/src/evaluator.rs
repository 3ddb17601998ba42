//! Memoized indicator evaluation over one immutable bar set.
//!
//! Many consumers of a dataset ask for the same indicator with the same
//! parameters. The [`Evaluator`] computes each distinct [`IndicatorSpec`] once
//! and hands every caller the same shared result. Results are pure functions
//! of (bars, spec), so the cache never needs invalidation while the bars are
//! fixed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bandline_core::config::{ConfigError, FlowTrendParams};
use bandline_core::domain::{Bar, BarSeries, DatasetHash};
use bandline_core::indicators::{
    Atr, FlowOscillator, FlowSource, FlowTrend, FlowTrendOutput, TrendBand, TrendBandOutput,
};
use bandline_core::structure::{
    BlockScan, FairValueGaps, GapScan, LiquidityScan, LiquidityZones, MarketStructure,
    OrderBlocks, StructureOutput, SwingDetector, SwingSnapshot,
};
use bandline_core::Indicator;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One indicator with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndicatorSpec {
    Atr {
        period: usize,
    },
    TrendBand {
        period: usize,
        multiplier: f64,
    },
    Flow {
        source: FlowSource,
        period: usize,
    },
    FlowTrend {
        atr_period: usize,
        atr_multiplier: f64,
        flow_period: usize,
        source: FlowSource,
    },
    Swings {
        swing_length: usize,
    },
    Structure {
        swing_length: usize,
    },
    FairValueGaps,
    OrderBlocks {
        range_window: usize,
        impulse_ratio: f64,
    },
    Liquidity {
        swing_length: usize,
        tolerance: f64,
    },
}

/// Hashable identity of a spec. Floats are keyed by bit pattern, so `3.0` and
/// `3.0000000000000004` are distinct entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SpecKey {
    Atr(usize),
    TrendBand(usize, u64),
    Flow(FlowSource, usize),
    FlowTrend(usize, u64, usize, FlowSource),
    Swings(usize),
    Structure(usize),
    FairValueGaps,
    OrderBlocks(usize, u64),
    Liquidity(usize, u64),
}

impl IndicatorSpec {
    fn key(&self) -> SpecKey {
        match *self {
            Self::Atr { period } => SpecKey::Atr(period),
            Self::TrendBand { period, multiplier } => SpecKey::TrendBand(period, multiplier.to_bits()),
            Self::Flow { source, period } => SpecKey::Flow(source, period),
            Self::FlowTrend {
                atr_period,
                atr_multiplier,
                flow_period,
                source,
            } => SpecKey::FlowTrend(atr_period, atr_multiplier.to_bits(), flow_period, source),
            Self::Swings { swing_length } => SpecKey::Swings(swing_length),
            Self::Structure { swing_length } => SpecKey::Structure(swing_length),
            Self::FairValueGaps => SpecKey::FairValueGaps,
            Self::OrderBlocks {
                range_window,
                impulse_ratio,
            } => SpecKey::OrderBlocks(range_window, impulse_ratio.to_bits()),
            Self::Liquidity {
                swing_length,
                tolerance,
            } => SpecKey::Liquidity(swing_length, tolerance.to_bits()),
        }
    }

    /// Validate the parameters and run the indicator over `bars`.
    pub fn compute(&self, bars: &[Bar]) -> Result<SeriesOutput, ConfigError> {
        let output = match *self {
            Self::Atr { period } => SeriesOutput::Atr(Atr::new(period)?.compute(bars)),
            Self::TrendBand { period, multiplier } => {
                SeriesOutput::TrendBand(TrendBand::new(period, multiplier)?.compute(bars))
            }
            Self::Flow { source, period } => {
                SeriesOutput::Flow(FlowOscillator::new(source, period)?.compute(bars))
            }
            Self::FlowTrend {
                atr_period,
                atr_multiplier,
                flow_period,
                source,
            } => {
                let params = FlowTrendParams {
                    atr_period,
                    atr_multiplier,
                    flow_period,
                    source,
                };
                SeriesOutput::FlowTrend(FlowTrend::new(params)?.compute(bars))
            }
            Self::Swings { swing_length } => {
                SeriesOutput::Swings(SwingDetector::new(swing_length)?.compute(bars))
            }
            Self::Structure { swing_length } => {
                SeriesOutput::Structure(MarketStructure::new(swing_length)?.compute(bars))
            }
            Self::FairValueGaps => SeriesOutput::FairValueGaps(FairValueGaps.compute(bars)),
            Self::OrderBlocks {
                range_window,
                impulse_ratio,
            } => SeriesOutput::OrderBlocks(OrderBlocks::new(range_window, impulse_ratio)?.compute(bars)),
            Self::Liquidity {
                swing_length,
                tolerance,
            } => SeriesOutput::Liquidity(LiquidityZones::new(swing_length, tolerance)?.compute(bars)),
        };
        Ok(output)
    }
}

/// Per-bar output column of one indicator, aligned with the input bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "snake_case")]
pub enum SeriesOutput {
    Atr(Vec<Option<f64>>),
    TrendBand(Vec<Option<TrendBandOutput>>),
    Flow(Vec<Option<f64>>),
    FlowTrend(Vec<Option<FlowTrendOutput>>),
    Swings(Vec<Option<SwingSnapshot>>),
    Structure(Vec<Option<StructureOutput>>),
    FairValueGaps(Vec<Option<GapScan>>),
    OrderBlocks(Vec<Option<BlockScan>>),
    Liquidity(Vec<Option<LiquidityScan>>),
}

impl SeriesOutput {
    pub fn len(&self) -> usize {
        match self {
            Self::Atr(v) | Self::Flow(v) => v.len(),
            Self::TrendBand(v) => v.len(),
            Self::FlowTrend(v) => v.len(),
            Self::Swings(v) => v.len(),
            Self::Structure(v) => v.len(),
            Self::FairValueGaps(v) => v.len(),
            Self::OrderBlocks(v) => v.len(),
            Self::Liquidity(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of warmup slots before the first value.
    pub fn warmup(&self) -> usize {
        fn leading_none<T>(v: &[Option<T>]) -> usize {
            v.iter().take_while(|x| x.is_none()).count()
        }
        match self {
            Self::Atr(v) | Self::Flow(v) => leading_none(v),
            Self::TrendBand(v) => leading_none(v),
            Self::FlowTrend(v) => leading_none(v),
            Self::Swings(v) => leading_none(v),
            Self::Structure(v) => leading_none(v),
            Self::FairValueGaps(v) => leading_none(v),
            Self::OrderBlocks(v) => leading_none(v),
            Self::Liquidity(v) => leading_none(v),
        }
    }
}

/// Shared, memoizing evaluator for one dataset.
pub struct Evaluator {
    bars: Arc<[Bar]>,
    dataset_hash: DatasetHash,
    cache: Mutex<HashMap<SpecKey, Arc<SeriesOutput>>>,
}

impl Evaluator {
    pub fn new(bars: impl Into<Arc<[Bar]>>) -> Self {
        let bars = bars.into();
        let dataset_hash = DatasetHash::of_bars(&bars);
        Self {
            bars,
            dataset_hash,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_series(series: &BarSeries) -> Self {
        Self::new(series.bars())
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn dataset_hash(&self) -> &DatasetHash {
        &self.dataset_hash
    }

    /// Return the cached output for `spec`, computing it on first request.
    ///
    /// Invalid parameters are reported on every request and never cached.
    pub fn evaluate(&self, spec: &IndicatorSpec) -> Result<Arc<SeriesOutput>, ConfigError> {
        let key = spec.key();
        if let Some(hit) = self.lock().get(&key) {
            debug!(?spec, dataset = %self.dataset_hash, "indicator cache hit");
            return Ok(Arc::clone(hit));
        }

        // Computed outside the lock so independent specs do not serialize.
        debug!(?spec, dataset = %self.dataset_hash, bars = self.bars.len(), "indicator cache miss");
        let computed = Arc::new(spec.compute(&self.bars)?);

        // A concurrent request may have won the race; keep the first result so
        // every caller shares one allocation.
        let mut cache = self.lock();
        let entry = cache.entry(key).or_insert(computed);
        Ok(Arc::clone(entry))
    }

    /// Evaluate many specs, computing missing ones in parallel.
    ///
    /// Results are returned in the order of `specs`.
    pub fn evaluate_all(&self, specs: &[IndicatorSpec]) -> Result<Vec<Arc<SeriesOutput>>, ConfigError> {
        specs.par_iter().map(|spec| self.evaluate(spec)).collect()
    }

    pub fn cache_len(&self) -> usize {
        self.lock().len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SpecKey, Arc<SeriesOutput>>> {
        // Entries are inserted whole, so a poisoned map is still consistent.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
