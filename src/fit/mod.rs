//! Forecast orchestration.
//!
//! Responsibilities:
//!
//! - derive a per-company seed
//! - train one regressor per company (parallel)
//! - extrapolate and date the forecast horizon

pub mod forecaster;

pub use forecaster::*;
