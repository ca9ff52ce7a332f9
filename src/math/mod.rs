//! Numerical building blocks: dense layers and the Adam optimizer.

pub mod adam;
pub mod dense;

pub use adam::*;
pub use dense::*;
