//! Per-context pipeline: one bar in, every component advanced once.
//!
//! A `Pipeline` owns all mutable state for one `(instrument, parameter-set)`
//! pairing. Independent pipelines share nothing and can be driven from
//! different threads. `run` is defined as repeated `push` from a fresh state, so
//! historical replay and live evaluation produce identical columns.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::{ConfigError, PipelineConfig};
use crate::domain::{Bar, BarError, StructureEvent};
use crate::indicator::Indicator;
use crate::indicators::{
    Atr, AtrState, FlowTrend, FlowTrendOutput, FlowTrendState, TrendBand, TrendBandOutput,
    TrendBandState,
};
use crate::structure::{
    BlockScan, FairValueGaps, FvgState, GapScan, LiquidityScan, LiquidityZones, MarketStructure,
    MarketStructureState, OrderBlockState, OrderBlocks, StructureOutput, SwingSnapshot,
};

/// Validated components for one parameter set.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Components {
    atr: Atr,
    trend_band: TrendBand,
    flow_trend: FlowTrend,
    structure: MarketStructure,
    gaps: FairValueGaps,
    order_blocks: OrderBlocks,
    liquidity: LiquidityZones,
}

impl Components {
    /// Construct every component, stopping at the first invalid parameter set.
    pub(crate) fn build(config: &PipelineConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            atr: Atr::from_params(&config.range)?,
            trend_band: TrendBand::from_params(&config.trend_band)?,
            flow_trend: FlowTrend::new(config.flow_trend)?,
            structure: MarketStructure::from_params(&config.swing)?,
            gaps: FairValueGaps,
            order_blocks: OrderBlocks::from_params(&config.zones)?,
            liquidity: LiquidityZones::from_params(&config.swing, &config.zones)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PipelineState {
    atr: AtrState,
    trend_band: TrendBandState,
    flow_trend: FlowTrendState,
    structure: MarketStructureState,
    gaps: FvgState,
    order_blocks: OrderBlockState,
    index: usize,
    last_timestamp: Option<NaiveDateTime>,
}

impl PipelineState {
    fn initial(c: &Components) -> Self {
        Self {
            atr: c.atr.initial_state(),
            trend_band: c.trend_band.initial_state(),
            flow_trend: c.flow_trend.initial_state(),
            structure: c.structure.initial_state(),
            gaps: c.gaps.initial_state(),
            order_blocks: c.order_blocks.initial_state(),
            index: 0,
            last_timestamp: None,
        }
    }
}

/// Outputs of every component for one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRow {
    pub index: usize,
    pub timestamp: NaiveDateTime,
    pub atr: Option<f64>,
    pub trend_band: Option<TrendBandOutput>,
    pub flow_trend: Option<FlowTrendOutput>,
    pub swings: Option<SwingSnapshot>,
    pub structure: Option<StructureOutput>,
    pub gaps: Option<GapScan>,
    pub order_blocks: Option<BlockScan>,
    pub liquidity: Option<LiquidityScan>,
}

impl PipelineRow {
    pub fn event(&self) -> Option<StructureEvent> {
        self.structure.and_then(|s| s.event)
    }
}

/// Index-aligned output columns plus the sparse structure-event list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub timestamps: Vec<NaiveDateTime>,
    pub atr: Vec<Option<f64>>,
    pub trend_band: Vec<Option<TrendBandOutput>>,
    pub flow_trend: Vec<Option<FlowTrendOutput>>,
    pub swings: Vec<Option<SwingSnapshot>>,
    pub structure: Vec<Option<StructureOutput>>,
    pub gaps: Vec<Option<GapScan>>,
    pub order_blocks: Vec<Option<BlockScan>>,
    pub liquidity: Vec<Option<LiquidityScan>>,
    pub events: Vec<StructureEvent>,
}

impl PipelineOutput {
    pub fn push_row(&mut self, row: PipelineRow) {
        if let Some(event) = row.event() {
            self.events.push(event);
        }
        self.timestamps.push(row.timestamp);
        self.atr.push(row.atr);
        self.trend_band.push(row.trend_band);
        self.flow_trend.push(row.flow_trend);
        self.swings.push(row.swings);
        self.structure.push(row.structure);
        self.gaps.push(row.gaps);
        self.order_blocks.push(row.order_blocks);
        self.liquidity.push(row.liquidity);
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Reassemble the row at `index`.
    pub fn row(&self, index: usize) -> Option<PipelineRow> {
        Some(PipelineRow {
            index,
            timestamp: *self.timestamps.get(index)?,
            atr: self.atr[index],
            trend_band: self.trend_band[index],
            flow_trend: self.flow_trend[index],
            swings: self.swings[index],
            structure: self.structure[index],
            gaps: self.gaps[index],
            order_blocks: self.order_blocks[index],
            liquidity: self.liquidity[index],
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    config: PipelineConfig,
    components: Components,
    state: PipelineState,
}

impl Pipeline {
    /// Validate `config` and create fresh state.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        let components = Components::build(&config)?;
        let state = PipelineState::initial(&components);
        debug!(?config, "pipeline constructed");
        Ok(Self {
            config,
            components,
            state,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Number of bars consumed since construction or the last reset.
    pub fn bars_seen(&self) -> usize {
        self.state.index
    }

    /// Advance every component by one bar.
    ///
    /// Bars must arrive in timestamp order; use [`Pipeline::try_push`] when the
    /// source has not already been validated.
    pub fn push(&mut self, bar: &Bar) -> PipelineRow {
        let c = &self.components;
        let s = &mut self.state;

        let atr = c.atr.step(&mut s.atr, bar);
        let trend_band = c.trend_band.step(&mut s.trend_band, bar);
        let flow_trend = c.flow_trend.step(&mut s.flow_trend, bar);
        let (swings, structure) = c.structure.step_with_swings(&mut s.structure, bar);
        let gaps = c.gaps.step(&mut s.gaps, bar);
        let order_blocks = c.order_blocks.step(&mut s.order_blocks, bar);
        // Shares the structure's swing state instead of detecting swings twice.
        let liquidity = swings.map(|snap| c.liquidity.scan(s.structure.swings().history(), &snap));

        let row = PipelineRow {
            index: s.index,
            timestamp: bar.timestamp,
            atr,
            trend_band,
            flow_trend,
            swings,
            structure,
            gaps,
            order_blocks,
            liquidity,
        };
        s.index += 1;
        s.last_timestamp = Some(bar.timestamp);
        row
    }

    /// Like [`Pipeline::push`], but refuses insane or out-of-order bars without
    /// touching any state.
    pub fn try_push(&mut self, bar: &Bar) -> Result<PipelineRow, BarError> {
        if !bar.is_sane() {
            return Err(BarError::Insane {
                timestamp: bar.timestamp,
            });
        }
        if let Some(previous) = self.state.last_timestamp {
            if bar.timestamp <= previous {
                return Err(BarError::OutOfOrder {
                    timestamp: bar.timestamp,
                    previous,
                });
            }
        }
        Ok(self.push(bar))
    }

    /// Evaluate `bars` from a fresh state. `self` is not modified.
    #[instrument(skip_all, fields(bars = bars.len()))]
    pub fn run(&self, bars: &[Bar]) -> PipelineOutput {
        let mut fresh = Self {
            config: self.config,
            components: self.components.clone(),
            state: PipelineState::initial(&self.components),
        };
        let mut output = PipelineOutput::default();
        for bar in bars {
            output.push_row(fresh.push(bar));
        }
        debug!(events = output.events.len(), "replay complete");
        output
    }

    /// Drop all history (stream restart).
    pub fn reset(&mut self) {
        debug!(bars_seen = self.state.index, "pipeline reset");
        self.state = PipelineState::initial(&self.components);
    }
}

/// Validate `config` and evaluate `bars` in one call.
pub fn evaluate(config: PipelineConfig, bars: &[Bar]) -> Result<PipelineOutput, ConfigError> {
    Ok(Pipeline::new(config)?.run(bars))
}
