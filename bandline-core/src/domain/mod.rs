//! Domain types for bandline

pub mod bar;
pub mod ids;
pub mod market;
pub mod series;

pub use bar::Bar;
pub use ids::DatasetHash;
pub use market::{
    BreakKind, Cross, Direction, StructureEvent, SwingKind, SwingLevel, Trend,
};
pub use series::{BarError, BarSeries};
