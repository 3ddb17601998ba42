//! Directional and market-structure value types shared by the indicators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bias of a trend line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    pub fn is_bullish(self) -> bool {
        self == Direction::Bullish
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Bullish => write!(f, "bullish"),
            Direction::Bearish => write!(f, "bearish"),
        }
    }
}

/// Persistent trend state of the structure-break machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Trend {
    #[default]
    Neutral,
    Up,
    Down,
}

/// A line crossing its own lagged signal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cross {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwingKind {
    High,
    Low,
}

/// A confirmed local extremum.
///
/// `index` is the pivot bar; `confirmed_at` is the bar at which the pivot became
/// knowable (`index + swing_length`). Levels are never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingLevel {
    pub price: f64,
    pub index: usize,
    pub confirmed_at: usize,
    pub kind: SwingKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreakKind {
    /// Break of structure: continuation of the prevailing trend.
    Bos,
    /// Change of character: break against the prevailing trend.
    Choch,
}

/// A classified structure break emitted by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructureEvent {
    pub index: usize,
    pub kind: BreakKind,
    pub direction: Direction,
}

impl fmt::Display for StructureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            BreakKind::Bos => "BOS",
            BreakKind::Choch => "CHoCH",
        };
        write!(f, "{kind}-{} @ {}", self.direction, self.index)
    }
}
