//! Export per-timestamp predictions to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::PredictionRow;
use crate::error::AppError;

pub const PREDICTIONS_HEADER: [&str; 4] = ["timestamp", "actual", "predicted", "residual"];

/// Write predictions to a CSV file.
pub fn write_predictions_csv(path: &Path, rows: &[PredictionRow]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_predictions(file, rows)
        .map_err(|e| AppError::input(format!("Failed to write export CSV '{}': {e}", path.display())))
}

/// Values are written with four decimals; timestamps as RFC 3339.
pub fn write_predictions<W: Write>(writer: W, rows: &[PredictionRow]) -> Result<(), csv::Error> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(PREDICTIONS_HEADER)?;
    for r in rows {
        w.write_record([
            r.timestamp.to_rfc3339(),
            format!("{:.4}", r.actual),
            format!("{:.4}", r.predicted),
            format!("{:.4}", r.residual),
        ])?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn empty_predictions_write_only_the_header() {
        let mut buf = Vec::new();
        write_predictions(&mut buf, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "timestamp,actual,predicted,residual\n");
    }

    #[test]
    fn writes_header_and_rows() {
        let ts = FixedOffset::west_opt(5 * 3600).unwrap().with_ymd_and_hms(2008, 6, 1, 12, 0, 0).unwrap();
        let rows = vec![PredictionRow {
            timestamp: ts,
            actual: 100.0,
            predicted: 90.5,
            residual: 9.5,
        }];

        let mut buf = Vec::new();
        write_predictions(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "timestamp,actual,predicted,residual");
        assert_eq!(lines[1], "2008-06-01T12:00:00-05:00,100.0000,90.5000,9.5000");
        assert_eq!(lines.len(), 2);
    }
}
