//! Timestamp-robust lag features.
//!
//! A lag value for the record at `T` is the source value of the record at
//! exactly `T - offset`. The lookup goes through a timestamp index built over the
//! whole table rather than a fixed row-count lookback: hourly data with gaps
//! would otherwise pair a record with the wrong predecessor.
//!
//! A lag is missing (`None`) when no record sits at `T - offset` or when that
//! record's source value is itself missing. Neither case is an error.

use std::collections::HashMap;

use chrono::Duration;
use rayon::prelude::*;
use tracing::debug;

use crate::domain::{LagSpec, Table, Timestamp};
use crate::error::AppError;

/// Lag of `target_field` by `offset`, one value per record, in record order.
///
/// The table is not modified. Offset zero returns the column itself; a negative
/// offset looks forward in time.
pub fn compute_lag(table: &Table, target_field: &str, offset: Duration) -> Result<Vec<Option<f64>>, AppError> {
    let idx = table.require_column(target_field)?;

    let index: HashMap<Timestamp, Option<f64>> = table
        .records()
        .iter()
        .map(|r| (r.timestamp, r.values[idx]))
        .collect();

    let lagged = table
        .records()
        .iter()
        // An offset that leaves chrono's range has no record to point at.
        .map(|r| {
            r.timestamp
                .checked_sub_signed(offset)
                .and_then(|key| index.get(&key).copied())
                .flatten()
        })
        .collect::<Vec<_>>();

    debug!(
        field = target_field,
        offset_minutes = offset.num_minutes(),
        rows = lagged.len(),
        present = lagged.iter().filter(|v| v.is_some()).count(),
        "computed lag"
    );

    Ok(lagged)
}

/// Compute several lags in parallel. Output order follows `specs`.
pub fn compute_lags(table: &Table, specs: &[LagSpec]) -> Result<Vec<Vec<Option<f64>>>, AppError> {
    specs
        .par_iter()
        .map(|spec| compute_lag(table, &spec.source, spec.offset))
        .collect()
}

/// Compute each lag and store it in the table under the spec's name.
pub fn apply_lags(table: &mut Table, specs: &[LagSpec]) -> Result<(), AppError> {
    let columns = compute_lags(table, specs)?;
    for (spec, values) in specs.iter().zip(columns) {
        table.set_column(&spec.name, values)?;
    }
    Ok(())
}
