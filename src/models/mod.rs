//! Profit regression model.
//!
//! One small neural regressor is trained per company; see `regressor`.

pub mod regressor;

pub use regressor::*;
