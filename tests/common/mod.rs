//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::{FixedOffset, TimeZone};
use load_forecast::data::{SampleConfig, generate_sample, write_sample_csv};
use load_forecast::domain::{ForecastConfig, LagSpec, ModelKind, NetworkOptions, Timestamp};
use load_forecast::io::parse_cutoff;

/// Fixed offset used by every fixture (`-05:00`).
pub fn est() -> FixedOffset {
    FixedOffset::west_opt(5 * 3600).unwrap()
}

/// 2008-01-01 00:00 -05:00.
pub fn start() -> Timestamp {
    est().with_ymd_and_hms(2008, 1, 1, 0, 0, 0).unwrap()
}

/// Local midnight of `date` (`YYYY-MM-DD`).
pub fn cutoff(date: &str) -> Timestamp {
    parse_cutoff(date, est()).unwrap()
}

/// Fresh, empty scratch directory unique to this test process and `name`.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lf-it-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Four weeks of synthetic data with a few gaps; returns `(load, weather)` paths.
pub fn write_sample(dir: &Path, days: usize, seed: u64) -> (PathBuf, PathBuf) {
    let config = SampleConfig {
        start: start(),
        days,
        seed,
        zone: "NYC".to_string(),
        load_gap_prob: 0.005,
        weather_gap_prob: 0.01,
    };
    let data = generate_sample(&config).unwrap();
    write_sample_csv(dir, &data).unwrap()
}

/// Small, fast network settings.
pub fn quick_network() -> NetworkOptions {
    NetworkOptions {
        hidden: 8,
        epochs: 300,
        learning_rate: 0.01,
        validation_fraction: 0.15,
        max_fail: 6,
        seed: 42,
    }
}

pub fn forecast_config(load: &Path, weather: &Path, model: ModelKind, cutoff: Timestamp) -> ForecastConfig {
    ForecastConfig {
        load_csv: load.to_path_buf(),
        weather_csv: weather.to_path_buf(),
        zone: "NYC".to_string(),
        utc_offset: est(),
        cutoff,
        model,
        network: quick_network(),
        lags: LagSpec::defaults(),
        plot: false,
        plot_width: 80,
        plot_height: 20,
        export_predictions: None,
        export_model: None,
    }
}
