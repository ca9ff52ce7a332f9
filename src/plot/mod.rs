//! Chart construction and rendering.
//!
//! - `chart`: groups + predictions → `ChartSpec`
//! - `ascii`: terminal grid renderer
//! - `svg`: plotters SVG renderer

pub mod ascii;
pub mod chart;
pub mod svg;

pub use ascii::*;
pub use chart::*;
pub use svg::*;
