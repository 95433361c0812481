//! Synthetic hourly load and weather generation.
//!
//! Produces a pair of CSV files in the same layout the ingest layer reads, so
//! the whole pipeline can be exercised without real utility exports.

use std::f64::consts::TAU;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, Timelike};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::info;

use crate::domain::Timestamp;
use crate::error::AppError;

pub const LOAD_FILE: &str = "load.csv";
pub const WEATHER_FILE: &str = "weather.csv";

/// Average load level (MW) before seasonal and weather effects.
const BASE_LOAD: f64 = 5500.0;
/// Above this temperature (°F) cooling demand kicks in.
const COOLING_THRESHOLD: f64 = 65.0;
/// Below this temperature (°F) heating demand kicks in.
const HEATING_THRESHOLD: f64 = 50.0;
const COOLING_SLOPE: f64 = 45.0;
const HEATING_SLOPE: f64 = 30.0;
const WEEKEND_FACTOR: f64 = 0.88;
const LOAD_NOISE_SD: f64 = 60.0;
const TEMPERATURE_NOISE_SD: f64 = 1.5;

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub start: Timestamp,
    pub days: usize,
    pub seed: u64,
    pub zone: String,
    /// Chance that an hour is absent from the load file.
    pub load_gap_prob: f64,
    /// Chance that an hour has an empty temperature cell.
    pub weather_gap_prob: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub timestamp: Timestamp,
    pub load: Option<f64>,
    pub temperature: Option<f64>,
    pub dew_point: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub zone: String,
    pub rows: Vec<SampleRow>,
}

pub fn generate_sample(config: &SampleConfig) -> Result<SampleData, AppError> {
    if config.days == 0 {
        return Err(AppError::input("Sample length must be at least one day."));
    }
    if config.zone.trim().is_empty() {
        return Err(AppError::input("Zone name must not be empty."));
    }
    for (name, p) in [
        ("load gap", config.load_gap_prob),
        ("weather gap", config.weather_gap_prob),
    ] {
        if !(0.0..1.0).contains(&p) {
            return Err(AppError::input(format!("Invalid {name} probability {p}; expected [0, 1).")));
        }
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let load_noise = Normal::new(0.0, LOAD_NOISE_SD)
        .map_err(|e| AppError::runtime(format!("Noise distribution error: {e}")))?;
    let temp_noise = Normal::new(0.0, TEMPERATURE_NOISE_SD)
        .map_err(|e| AppError::runtime(format!("Noise distribution error: {e}")))?;

    let hours = config.days * 24;
    let mut rows = Vec::with_capacity(hours);
    for h in 0..hours {
        let timestamp = config.start + Duration::hours(h as i64);

        let temperature = seasonal_temperature(&timestamp) + temp_noise.sample(&mut rng);
        let spread = 8.0 + 3.0 * rng.gen_range(-1.0..=1.0);
        let dew_point = temperature - spread;
        let load = seasonal_load(&timestamp, temperature) + load_noise.sample(&mut rng);

        let weather_gap = rng.gen_bool(config.weather_gap_prob);
        let load_gap = rng.gen_bool(config.load_gap_prob);

        rows.push(SampleRow {
            timestamp,
            load: (!load_gap).then_some(load),
            temperature: (!weather_gap).then_some(temperature),
            dew_point: (!weather_gap).then_some(dew_point),
        });
    }

    Ok(SampleData {
        zone: config.zone.clone(),
        rows,
    })
}

/// Annual cycle (coldest mid-January) plus a daily cycle peaking mid-afternoon.
fn seasonal_temperature(ts: &Timestamp) -> f64 {
    let doy = ts.ordinal0() as f64;
    let hour = ts.hour() as f64;
    let annual = 55.0 - 22.0 * (TAU * (doy - 15.0) / 365.0).cos();
    let daily = 8.0 * (TAU * (hour - 15.0) / 24.0).cos();
    annual + daily
}

fn seasonal_load(ts: &Timestamp, temperature: f64) -> f64 {
    let hour = ts.hour() as f64;
    // Overnight trough around 04:00, evening peak around 18:00.
    let daily = -700.0 * (TAU * (hour - 4.0) / 24.0).cos() + 250.0 * (TAU * (hour - 18.0) / 12.0).cos();
    let weather = COOLING_SLOPE * (temperature - COOLING_THRESHOLD).max(0.0)
        + HEATING_SLOPE * (HEATING_THRESHOLD - temperature).max(0.0);
    let weekday = ts.weekday().number_from_monday();
    let level = if weekday >= 6 { BASE_LOAD * WEEKEND_FACTOR } else { BASE_LOAD };
    level + daily + weather
}

/// Write `load.csv` and `weather.csv` into `dir`, creating it if needed.
pub fn write_sample_csv(dir: &Path, data: &SampleData) -> Result<(PathBuf, PathBuf), AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::input(format!("Failed to create output directory '{}': {e}", dir.display())))?;

    let load_path = dir.join(LOAD_FILE);
    let weather_path = dir.join(WEATHER_FILE);

    write_file(&load_path, |f| write_load(f, data))?;
    write_file(&weather_path, |f| write_weather(f, data))?;

    info!(
        rows = data.rows.len(),
        load = %load_path.display(),
        weather = %weather_path.display(),
        "wrote sample data"
    );
    Ok((load_path, weather_path))
}

fn write_file(path: &Path, write: impl FnOnce(File) -> Result<(), csv::Error>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create '{}': {e}", path.display())))?;
    write(file).map_err(|e| AppError::input(format!("Failed to write '{}': {e}", path.display())))
}

/// Load CSV: `timestamp,<zone>`; gap hours are left out entirely.
pub fn write_load<W: Write>(writer: W, data: &SampleData) -> Result<(), csv::Error> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(["timestamp", data.zone.as_str()])?;
    for row in &data.rows {
        if let Some(load) = row.load {
            w.write_record([row.timestamp.to_rfc3339(), format!("{load:.1}")])?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Weather CSV: `timestamp,temperature` with `"[t, d]"` pairs; gap hours have
/// an empty cell.
pub fn write_weather<W: Write>(writer: W, data: &SampleData) -> Result<(), csv::Error> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(["timestamp", "temperature"])?;
    for row in &data.rows {
        let cell = match (row.temperature, row.dew_point) {
            (Some(t), Some(d)) => format!("[{t:.1}, {d:.1}]"),
            _ => String::new(),
        };
        w.write_record([row.timestamp.to_rfc3339(), cell])?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{COL_DEW_POINT, COL_LOAD, COL_TEMPERATURE};
    use crate::io::{read_load_table, read_weather_table};
    use chrono::{FixedOffset, TimeZone};

    fn config(days: usize) -> SampleConfig {
        SampleConfig {
            start: FixedOffset::west_opt(5 * 3600).unwrap().with_ymd_and_hms(2008, 1, 1, 0, 0, 0).unwrap(),
            days,
            seed: 7,
            zone: "NYC".to_string(),
            load_gap_prob: 0.0,
            weather_gap_prob: 0.0,
        }
    }

    #[test]
    fn deterministic_for_a_seed() {
        let a = generate_sample(&config(3)).unwrap();
        let b = generate_sample(&config(3)).unwrap();
        assert_eq!(a.rows, b.rows);
        assert_eq!(a.rows.len(), 72);
    }

    #[test]
    fn summer_afternoons_outdraw_winter_nights_in_temperature() {
        let data = generate_sample(&config(365)).unwrap();
        let jan_night = data.rows[4].temperature.unwrap();
        let jul_afternoon = data.rows[(182 * 24) + 15].temperature.unwrap();
        assert!(jul_afternoon > jan_night + 20.0);
        assert!(data.rows.iter().all(|r| r.dew_point.unwrap() < r.temperature.unwrap()));
    }

    #[test]
    fn gaps_follow_probabilities() {
        let mut cfg = config(30);
        cfg.load_gap_prob = 0.1;
        cfg.weather_gap_prob = 0.2;
        let data = generate_sample(&cfg).unwrap();
        let load_gaps = data.rows.iter().filter(|r| r.load.is_none()).count();
        let weather_gaps = data.rows.iter().filter(|r| r.temperature.is_none()).count();
        assert!(load_gaps > 20 && load_gaps < 150, "load gaps {load_gaps}");
        assert!(weather_gaps > 70 && weather_gaps < 220, "weather gaps {weather_gaps}");
    }

    #[test]
    fn invalid_config_is_input_error() {
        let mut cfg = config(0);
        assert_eq!(generate_sample(&cfg).unwrap_err().exit_code(), 2);
        cfg.days = 1;
        cfg.weather_gap_prob = 1.0;
        assert_eq!(generate_sample(&cfg).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn written_csv_reads_back_through_ingest() {
        let mut cfg = config(2);
        cfg.load_gap_prob = 0.1;
        cfg.weather_gap_prob = 0.1;
        let data = generate_sample(&cfg).unwrap();
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();

        let mut load_buf = Vec::new();
        write_load(&mut load_buf, &data).unwrap();
        let load = read_load_table(load_buf.as_slice(), "nyc", offset).unwrap();
        let expected_load = data.rows.iter().filter(|r| r.load.is_some()).count();
        assert_eq!(load.table.len(), expected_load);
        assert!(load.row_errors.is_empty());
        assert!(load.table.column(COL_LOAD).unwrap().iter().all(|v| v.is_some()));

        let mut weather_buf = Vec::new();
        write_weather(&mut weather_buf, &data).unwrap();
        let weather = read_weather_table(weather_buf.as_slice(), offset).unwrap();
        assert_eq!(weather.table.len(), 48);
        let temps = weather.table.column(COL_TEMPERATURE).unwrap();
        let dews = weather.table.column(COL_DEW_POINT).unwrap();
        for (i, row) in data.rows.iter().enumerate() {
            assert_eq!(temps[i].is_some(), row.temperature.is_some());
            assert_eq!(dews[i].is_some(), row.dew_point.is_some());
        }
    }
}
