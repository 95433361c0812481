//! CSV ingest.
//!
//! Turns the load and weather exports into time-keyed `Table`s.
//!
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation**: rows with an unparseable or duplicate timestamp
//!   are skipped and reported; unparseable numeric cells become missing values
//! - **No feature logic here**

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::{COL_DEW_POINT, COL_LOAD, COL_TEMPERATURE, Table, Timestamp};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the table plus what was skipped.
#[derive(Debug, Clone)]
pub struct IngestedTable {
    pub table: Table,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load the zone column of a load CSV into a single-column `load` table.
pub fn load_load_csv(path: &Path, zone: &str, offset: FixedOffset) -> Result<IngestedTable, AppError> {
    let file = open(path)?;
    let ingested = read_load_table(file, zone, offset)?;
    log_ingest("load", path, &ingested);
    Ok(ingested)
}

/// Load a weather CSV into a `temperature` / `dew_point` table.
pub fn load_weather_csv(path: &Path, offset: FixedOffset) -> Result<IngestedTable, AppError> {
    let file = open(path)?;
    let ingested = read_weather_table(file, offset)?;
    log_ingest("weather", path, &ingested);
    Ok(ingested)
}

pub fn read_load_table<R: Read>(reader: R, zone: &str, offset: FixedOffset) -> Result<IngestedTable, AppError> {
    let (headers, mut reader) = csv_reader(reader)?;
    let header_map = build_header_map(&headers);

    ensure_column(&header_map, "timestamp")?;
    let zone_key = normalize_header_name(zone);
    let zone_idx = *header_map.get(&zone_key).ok_or_else(|| {
        AppError::input(format!(
            "Load CSV has no column for zone `{zone}` (available: {}).",
            available_columns(&headers)
        ))
    })?;

    let mut table = Table::new(vec![COL_LOAD.to_string()]);
    let (row_errors, rows_read) = for_each_row(&mut reader, &header_map, offset, |record, ts| {
        let load = parse_opt_f64(record.get(zone_idx).map(str::trim));
        table.push(ts, vec![load])
    })?;

    Ok(IngestedTable {
        table,
        row_errors,
        rows_read,
    })
}

/// Weather rows carry either a `temperature` pair (`"[t, d]"` or `"t;d"`) or
/// separate `temperature` and `dew_point` columns.
pub fn read_weather_table<R: Read>(reader: R, offset: FixedOffset) -> Result<IngestedTable, AppError> {
    let (headers, mut reader) = csv_reader(reader)?;
    let header_map = build_header_map(&headers);

    ensure_column(&header_map, "timestamp")?;
    ensure_column(&header_map, COL_TEMPERATURE)?;
    let has_dew_point = header_map.contains_key(COL_DEW_POINT);

    let mut table = Table::new(vec![COL_TEMPERATURE.to_string(), COL_DEW_POINT.to_string()]);
    let (row_errors, rows_read) = for_each_row(&mut reader, &header_map, offset, |record, ts| {
        let raw = get_optional(record, &header_map, COL_TEMPERATURE);
        let (temperature, dew_point) = if has_dew_point {
            (
                parse_opt_f64(raw),
                parse_opt_f64(get_optional(record, &header_map, COL_DEW_POINT)),
            )
        } else {
            parse_pair(raw)
        };
        table.push(ts, vec![temperature, dew_point])
    })?;

    Ok(IngestedTable {
        table,
        row_errors,
        rows_read,
    })
}

/// Parse a timestamp. RFC 3339 strings keep their own offset; naive
/// date-times are interpreted in `offset`.
pub fn parse_timestamp(s: &str, offset: FixedOffset) -> Result<Timestamp, String> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts);
    }

    const FMTS: [&str; 4] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];
    for fmt in FMTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return localize(naive, offset);
        }
    }

    Err(format!(
        "Invalid timestamp '{s}'. Expected RFC 3339 or YYYY-MM-DD HH:MM[:SS]."
    ))
}

/// Parse the split cutoff: a bare date means midnight in `offset`.
pub fn parse_cutoff(s: &str, offset: FixedOffset) -> Result<Timestamp, String> {
    if let Ok(date) = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
        return localize(date.and_hms_opt(0, 0, 0).ok_or("Invalid cutoff date.")?, offset);
    }
    parse_timestamp(s, offset)
}

/// Parse `+HH:MM`, `-HH:MM`, `+HHMM`, `Z` or `UTC`.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset, String> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(|| "Invalid UTC offset.".to_string());
    }

    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(format!("Invalid UTC offset '{s}'. Expected e.g. -05:00.")),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("Invalid UTC offset '{s}'. Expected e.g. -05:00."));
    }
    let hours: i32 = digits[..2].parse().map_err(|_| format!("Invalid UTC offset '{s}'."))?;
    let minutes: i32 = digits[2..].parse().map_err(|_| format!("Invalid UTC offset '{s}'."))?;

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| format!("UTC offset '{s}' is out of range."))
}

fn localize(naive: NaiveDateTime, offset: FixedOffset) -> Result<Timestamp, String> {
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| format!("Timestamp '{naive}' does not exist at offset {offset}."))
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))
}

fn csv_reader<R: Read>(reader: R) -> Result<(StringRecord, csv::Reader<R>), AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();

    Ok((headers, reader))
}

/// Drive the record loop shared by both inputs: timestamp parsing, duplicate
/// detection and row-error bookkeeping.
fn for_each_row<R: Read>(
    reader: &mut csv::Reader<R>,
    header_map: &HashMap<String, usize>,
    offset: FixedOffset,
    mut push: impl FnMut(&StringRecord, Timestamp) -> Result<(), AppError>,
) -> Result<(Vec<RowError>, usize), AppError> {
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut seen: HashSet<Timestamp> = HashSet::new();

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header; CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let ts = match get_required(&record, header_map, "timestamp").and_then(|s| parse_timestamp(s, offset)) {
            Ok(ts) => ts,
            Err(message) => {
                row_errors.push(RowError { line, message });
                continue;
            }
        };

        if !seen.insert(ts) {
            row_errors.push(RowError {
                line,
                message: format!("Duplicate timestamp {ts}; keeping the first row."),
            });
            continue;
        }

        push(&record, ts)?;
    }

    Ok((row_errors, rows_read))
}

fn log_ingest(kind: &str, path: &Path, ingested: &IngestedTable) {
    info!(
        kind,
        path = %path.display(),
        rows_read = ingested.rows_read,
        rows_used = ingested.table.len(),
        row_errors = ingested.row_errors.len(),
        "ingested CSV"
    );
    for e in ingested.row_errors.iter().take(5) {
        warn!(kind, line = e.line, "{}", e.message);
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_column(header_map: &HashMap<String, usize>, name: &str) -> Result<(), AppError> {
    if !header_map.contains_key(name) {
        return Err(AppError::input(format!("Missing required column: `{name}`")));
    }
    Ok(())
}

fn available_columns(headers: &StringRecord) -> String {
    headers
        .iter()
        .map(normalize_header_name)
        .filter(|h| h != "timestamp")
        .collect::<Vec<_>>()
        .join(", ")
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?;
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

/// `"[31.2, 18.0]"`, `"31.2;18.0"` or `"31.2 18.0"` -> (31.2, 18.0).
/// A lone number is a temperature without dew point.
fn parse_pair(s: Option<&str>) -> (Option<f64>, Option<f64>) {
    let Some(s) = s else { return (None, None) };
    let inner = s.trim().trim_start_matches('[').trim_end_matches(']');
    let mut parts = inner
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|p| !p.is_empty());
    let temperature = parse_opt_f64(parts.next());
    let dew_point = parse_opt_f64(parts.next());
    (temperature, dew_point)
}
