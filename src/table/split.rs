//! Cutoff split into training and testing subsets.

use crate::domain::{Record, Table, Timestamp};
use crate::error::AppError;

/// Records at or before `cutoff` train, later records test.
///
/// Every record lands in exactly one subset; relative order is preserved.
pub fn split_at_cutoff(table: &Table, cutoff: Timestamp) -> Result<(Table, Table), AppError> {
    let (train, test): (Vec<Record>, Vec<Record>) = table
        .records()
        .iter()
        .cloned()
        .partition(|r| r.timestamp <= cutoff);

    Ok((
        Table::with_records(table.columns().to_vec(), train)?,
        Table::with_records(table.columns().to_vec(), test)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, TimeZone};

    fn hour(h: i64) -> Timestamp {
        FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2008, 1, 1, 0, 0, 0)
            .unwrap()
            + Duration::hours(h)
    }

    #[test]
    fn cutoff_is_inclusive_for_training() {
        let mut t = Table::new(vec!["load".to_string()]);
        for h in 0..200 {
            t.push(hour(h), vec![Some(h as f64)]).unwrap();
        }

        let (train, test) = split_at_cutoff(&t, hour(100)).unwrap();
        assert_eq!(train.len(), 101);
        assert_eq!(test.len(), 99);
        assert_eq!(train.len() + test.len(), t.len());
        assert!(train.timestamps().all(|ts| ts <= hour(100)));
        assert!(test.timestamps().all(|ts| ts > hour(100)));
        assert_eq!(test.records()[0].timestamp, hour(101));
    }

    #[test]
    fn cutoff_before_data_puts_everything_in_test() {
        let mut t = Table::new(vec!["load".to_string()]);
        t.push(hour(5), vec![None]).unwrap();
        let (train, test) = split_at_cutoff(&t, hour(0)).unwrap();
        assert!(train.is_empty());
        assert_eq!(test.len(), 1);
    }
}
