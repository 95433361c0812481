//! Inner join on timestamp.

use std::collections::HashMap;

use crate::domain::{Record, Table, Timestamp};
use crate::error::AppError;

/// Keep only timestamps present in both tables, in `left` order.
///
/// Output columns are `left`'s followed by `right`'s. A right column whose name
/// is already taken gets a `_right` suffix.
pub fn inner_join(left: &Table, right: &Table) -> Result<Table, AppError> {
    let right_index: HashMap<Timestamp, usize> = right
        .records()
        .iter()
        .enumerate()
        .map(|(i, r)| (r.timestamp, i))
        .collect();

    let mut columns = left.columns().to_vec();
    for name in right.columns() {
        if columns.contains(name) {
            columns.push(format!("{name}_right"));
        } else {
            columns.push(name.clone());
        }
    }

    let records = left
        .records()
        .iter()
        .filter_map(|l| {
            let r = &right.records()[*right_index.get(&l.timestamp)?];
            let mut values = l.values.clone();
            values.extend_from_slice(&r.values);
            Some(Record {
                timestamp: l.timestamp,
                values,
            })
        })
        .collect();

    Table::with_records(columns, records)
}
