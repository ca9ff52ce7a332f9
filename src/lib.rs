//! `profit-forecast` library crate.
//!
//! The binary (`pf`) is a thin wrapper around this library so that:
//!
//! - the ingest → group → forecast → summarize pipeline is testable without
//!   spawning processes
//! - renderers (terminal, SVG, JSON) can be swapped without touching the math

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
