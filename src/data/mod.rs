//! Data preparation shared by the forecast and reporting stages.
//!
//! - `dates`: spreadsheet serials, free-form date text, month arithmetic
//! - `group`: per-company partition of normalized records

pub mod dates;
pub mod group;

pub use dates::*;
pub use group::*;
