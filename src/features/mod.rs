//! Feature engineering.
//!
//! - calendar parts (`calendar`)
//! - timestamp-keyed lag features (`lag`)
//! - transposed feature/target export (`matrix`)

pub mod calendar;
pub mod lag;
pub mod matrix;

pub use calendar::*;
pub use lag::*;
pub use matrix::*;

use crate::domain::{LagSpec, Table};
use crate::error::AppError;

/// Add calendar columns and every lag in `lags` to `table`.
pub fn build_features(table: &mut Table, lags: &[LagSpec]) -> Result<(), AppError> {
    add_calendar_features(table)?;
    apply_lags(table, lags)
}
