pub mod tables;
pub mod thresholds;

pub use thresholds::{Direction, ReferenceTables, SectorThresholds, ThresholdEntry};
