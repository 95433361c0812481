//! Calendar features derived from each record's timestamp.
//!
//! All parts are taken in the timestamp's own offset, so a table stored in
//! local time yields local hours.

use chrono::{Datelike, Timelike, Weekday};

use crate::domain::{COL_DAY_OF_WEEK, COL_HOUR, COL_IS_WEEKEND, COL_MONTH, Table, Timestamp};
use crate::error::AppError;

/// Calendar parts of a single timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarParts {
    /// 0-23
    pub hour: u32,
    /// 1-12
    pub month: u32,
    /// 1 = Sunday ... 7 = Saturday
    pub day_of_week: u32,
    pub is_weekend: bool,
}

impl CalendarParts {
    pub fn of(ts: &Timestamp) -> Self {
        let weekday = ts.weekday();
        Self {
            hour: ts.hour(),
            month: ts.month(),
            day_of_week: weekday.number_from_sunday(),
            is_weekend: matches!(weekday, Weekday::Sat | Weekday::Sun),
        }
    }
}

/// Append `hour`, `month`, `day_of_week` and `is_weekend` columns.
pub fn add_calendar_features(table: &mut Table) -> Result<(), AppError> {
    let parts: Vec<CalendarParts> = table.records().iter().map(|r| CalendarParts::of(&r.timestamp)).collect();

    table.set_column(COL_HOUR, parts.iter().map(|p| Some(p.hour as f64)).collect())?;
    table.set_column(COL_MONTH, parts.iter().map(|p| Some(p.month as f64)).collect())?;
    table.set_column(COL_DAY_OF_WEEK, parts.iter().map(|p| Some(p.day_of_week as f64)).collect())?;
    table.set_column(
        COL_IS_WEEKEND,
        parts.iter().map(|p| Some(if p.is_weekend { 1.0 } else { 0.0 })).collect(),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn est() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    #[test]
    fn saturday_evening_parts() {
        // 2008-03-15 was a Saturday.
        let ts = est().with_ymd_and_hms(2008, 3, 15, 18, 0, 0).unwrap();
        let p = CalendarParts::of(&ts);
        assert_eq!(p.hour, 18);
        assert_eq!(p.month, 3);
        assert_eq!(p.day_of_week, 7);
        assert!(p.is_weekend);
    }

    #[test]
    fn parts_use_local_offset() {
        // 03:00 UTC on a Monday is still Sunday 22:00 at UTC-5.
        let utc = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2008, 3, 17, 3, 0, 0).unwrap();
        let local = utc.with_timezone(&est());
        let p = CalendarParts::of(&local);
        assert_eq!(p.hour, 22);
        assert_eq!(p.day_of_week, 1);
        assert!(p.is_weekend);
    }

    #[test]
    fn adds_four_columns() {
        let mut t = Table::new(vec!["load".to_string()]);
        // Wednesday
        t.push(est().with_ymd_and_hms(2008, 1, 2, 9, 0, 0).unwrap(), vec![Some(1.0)]).unwrap();
        add_calendar_features(&mut t).unwrap();

        assert_eq!(t.columns(), ["load", "hour", "month", "day_of_week", "is_weekend"]);
        assert_eq!(t.value(0, "hour"), Some(9.0));
        assert_eq!(t.value(0, "month"), Some(1.0));
        assert_eq!(t.value(0, "day_of_week"), Some(4.0));
        assert_eq!(t.value(0, "is_weekend"), Some(0.0));
    }
}
