//! Numerical utilities: least squares and min-max scaling.

pub mod ols;
pub mod scaling;

pub use ols::*;
pub use scaling::*;
