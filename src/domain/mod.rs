//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw input cells/rows (`CellValue`, `RawRow`)
//! - normalized observations and forecasts (`ObservationRecord`, `PredictionRecord`)
//! - summaries, chart descriptions, and run configuration

pub mod types;

pub use types::*;
