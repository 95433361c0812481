//! Time-keyed tables.
//!
//! A `Table` is an ordered list of records plus a column schema. Every record
//! carries exactly one optional value per column; `None` marks a missing value.
//! Timestamps are not assumed contiguous or evenly spaced.

use crate::domain::Timestamp;
use crate::error::AppError;

/// One observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: Timestamp,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    pub fn with_records(columns: Vec<String>, records: Vec<Record>) -> Result<Self, AppError> {
        let mut table = Table::new(columns);
        for record in records {
            table.push(record.timestamp, record.values)?;
        }
        Ok(table)
    }

    /// Append a record. The value count must match the schema.
    pub fn push(&mut self, timestamp: Timestamp, values: Vec<Option<f64>>) -> Result<(), AppError> {
        if values.len() != self.columns.len() {
            return Err(AppError::runtime(format!(
                "Record at {timestamp} has {} values, table has {} columns.",
                values.len(),
                self.columns.len()
            )));
        }
        self.records.push(Record { timestamp, values });
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, AppError> {
        self.column_index(name)
            .ok_or_else(|| AppError::input(format!("Unknown column `{name}`.")))
    }

    /// Copy of one column, in record order.
    pub fn column(&self, name: &str) -> Result<Vec<Option<f64>>, AppError> {
        let idx = self.require_column(name)?;
        Ok(self.records.iter().map(|r| r.values[idx]).collect())
    }

    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        let idx = self.column_index(name)?;
        self.records.get(row)?.values[idx]
    }

    pub fn timestamps(&self) -> impl Iterator<Item = Timestamp> + '_ {
        self.records.iter().map(|r| r.timestamp)
    }

    pub fn time_range(&self) -> Option<(Timestamp, Timestamp)> {
        let first = self.records.iter().map(|r| r.timestamp).min()?;
        let last = self.records.iter().map(|r| r.timestamp).max()?;
        Some((first, last))
    }

    /// Replace a column, or append it when the name is new.
    pub fn set_column(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<(), AppError> {
        if values.len() != self.records.len() {
            return Err(AppError::runtime(format!(
                "Column `{name}` has {} values, table has {} records.",
                values.len(),
                self.records.len()
            )));
        }

        match self.column_index(name) {
            Some(idx) => {
                for (record, v) in self.records.iter_mut().zip(values) {
                    record.values[idx] = v;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (record, v) in self.records.iter_mut().zip(values) {
                    record.values.push(v);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn ts(hour: u32) -> Timestamp {
        FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2008, 1, 1, hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn push_rejects_wrong_arity() {
        let mut t = Table::new(vec!["load".to_string()]);
        assert!(t.push(ts(0), vec![Some(1.0), None]).is_err());
        assert!(t.push(ts(0), vec![Some(1.0)]).is_ok());
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn set_column_appends_then_replaces() {
        let mut t = Table::new(vec!["load".to_string()]);
        t.push(ts(0), vec![Some(1.0)]).unwrap();
        t.push(ts(1), vec![Some(2.0)]).unwrap();

        t.set_column("lag", vec![None, Some(1.0)]).unwrap();
        assert_eq!(t.columns(), ["load", "lag"]);
        assert_eq!(t.value(1, "lag"), Some(1.0));

        t.set_column("lag", vec![Some(9.0), Some(9.0)]).unwrap();
        assert_eq!(t.columns().len(), 2);
        assert_eq!(t.column("lag").unwrap(), vec![Some(9.0), Some(9.0)]);

        assert!(t.set_column("short", vec![None]).is_err());
    }

    #[test]
    fn unknown_column_is_input_error() {
        let t = Table::new(vec!["load".to_string()]);
        let err = t.column("temperature").unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }
}
