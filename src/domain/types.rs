//! Shared domain types.
//!
//! Configuration enums, lag specifications, prediction rows and the portable
//! model file. The table itself lives in `domain::table`.

use std::path::PathBuf;

use chrono::{DateTime, Duration, FixedOffset};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Observation key. Equality and hashing compare instants, not offsets.
pub type Timestamp = DateTime<FixedOffset>;

pub const COL_LOAD: &str = "load";
pub const COL_TEMPERATURE: &str = "temperature";
pub const COL_DEW_POINT: &str = "dew_point";
pub const COL_HOUR: &str = "hour";
pub const COL_MONTH: &str = "month";
pub const COL_DAY_OF_WEEK: &str = "day_of_week";
pub const COL_IS_WEEKEND: &str = "is_weekend";
pub const COL_LAG_DAY: &str = "lag_day";
pub const COL_LAG_HOUR: &str = "lag_hour";
pub const COL_LAG_WEEK: &str = "lag_week";

/// Leading feature rows of the model input; lag rows follow in lag order.
pub const BASE_FEATURES: [&str; 6] = [
    COL_HOUR,
    COL_MONTH,
    COL_DAY_OF_WEEK,
    COL_IS_WEEKEND,
    COL_TEMPERATURE,
    COL_DEW_POINT,
];

/// Model input rows: `BASE_FEATURES` then one row per lag.
pub fn feature_columns(lags: &[LagSpec]) -> Vec<String> {
    BASE_FEATURES
        .iter()
        .map(|s| s.to_string())
        .chain(lags.iter().map(|l| l.name.clone()))
        .collect()
}

/// One lag feature: `name[t] = source[t - offset]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LagSpec {
    pub name: String,
    pub source: String,
    pub offset: Duration,
}

impl LagSpec {
    pub fn hours(name: &str, source: &str, hours: i64) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            offset: Duration::hours(hours),
        }
    }

    /// Prior-day, prior-hour and prior-week load.
    pub fn defaults() -> Vec<LagSpec> {
        vec![
            LagSpec::hours(COL_LAG_DAY, COL_LOAD, 24),
            LagSpec::hours(COL_LAG_HOUR, COL_LOAD, 1),
            LagSpec::hours(COL_LAG_WEEK, COL_LOAD, 168),
        ]
    }

    pub fn to_file(&self) -> LagFile {
        LagFile {
            name: self.name.clone(),
            source: self.source.clone(),
            offset_minutes: self.offset.num_minutes(),
        }
    }
}

/// Serialized form of a `LagSpec`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LagFile {
    pub name: String,
    pub source: String,
    pub offset_minutes: i64,
}

impl LagFile {
    /// Fails when `offset_minutes` does not fit a `Duration`.
    pub fn to_spec(&self) -> Result<LagSpec, AppError> {
        let offset = Duration::try_minutes(self.offset_minutes).ok_or_else(|| {
            AppError::input(format!(
                "Lag `{}` has an out-of-range offset of {} minutes.",
                self.name, self.offset_minutes
            ))
        })?;
        Ok(LagSpec {
            name: self.name.clone(),
            source: self.source.clone(),
            offset,
        })
    }
}

/// Which predictor to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Feed-forward network with one tanh hidden layer.
    Network,
    /// Ordinary least squares baseline.
    Linear,
}

impl ModelKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Network => "Feed-forward network",
            ModelKind::Linear => "Linear (OLS)",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ModelKind::Network => ModelKind::Linear,
            ModelKind::Linear => ModelKind::Network,
        }
    }
}

/// Network training options.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkOptions {
    pub hidden: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    /// Share of training observations held out for early stopping.
    pub validation_fraction: f64,
    /// Consecutive epochs without validation improvement before stopping.
    pub max_fail: usize,
    pub seed: u64,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            hidden: 20,
            epochs: 1000,
            learning_rate: 0.01,
            validation_fraction: 0.15,
            max_fail: 6,
            seed: 42,
        }
    }
}

/// Fully resolved run configuration (CLI args + environment).
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub load_csv: PathBuf,
    pub weather_csv: PathBuf,
    pub zone: String,
    pub utc_offset: FixedOffset,
    pub cutoff: Timestamp,
    pub model: ModelKind,
    pub network: NetworkOptions,
    pub lags: Vec<LagSpec>,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_predictions: Option<PathBuf>,
    pub export_model: Option<PathBuf>,
}

/// Actual vs. predicted load at one timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRow {
    pub timestamp: Timestamp,
    pub actual: f64,
    pub predicted: f64,
    pub residual: f64,
}

/// Portable representation of a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub zone: String,
    pub trained_through: Timestamp,
    pub features: Vec<String>,
    pub lags: Vec<LagFile>,
    pub params: ModelParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelParams {
    Network(NetworkParams),
    Linear(LinearParams),
}

impl ModelParams {
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelParams::Network(_) => ModelKind::Network,
            ModelParams::Linear(_) => ModelKind::Linear,
        }
    }
}

/// Network weights, row-major, plus the scaling ranges used in training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub input_min: Vec<f64>,
    pub input_max: Vec<f64>,
    pub target_min: f64,
    pub target_max: f64,
    pub hidden_weights: Vec<Vec<f64>>,
    pub hidden_bias: Vec<f64>,
    pub output_weights: Vec<f64>,
    pub output_bias: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearParams {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_feature_order() {
        let cols = feature_columns(&LagSpec::defaults());
        assert_eq!(
            cols,
            [
                "hour",
                "month",
                "day_of_week",
                "is_weekend",
                "temperature",
                "dew_point",
                "lag_day",
                "lag_hour",
                "lag_week"
            ]
        );
    }

    #[test]
    fn lag_file_round_trips_offset() {
        let spec = LagSpec::hours(COL_LAG_WEEK, COL_LOAD, 168);
        let file = spec.to_file();
        assert_eq!(file.offset_minutes, 168 * 60);
        assert_eq!(file.to_spec().unwrap(), spec);
    }

    #[test]
    fn out_of_range_lag_offset_is_input_error() {
        let file = LagFile {
            name: COL_LAG_DAY.to_string(),
            source: COL_LOAD.to_string(),
            offset_minutes: i64::MAX / 2,
        };
        let err = file.to_spec().unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().contains("lag_day"));
    }

    #[test]
    fn model_params_serialize_with_kind_tag() {
        let params = ModelParams::Linear(LinearParams {
            intercept: 1.0,
            coefficients: vec![2.0],
        });
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"kind\":\"linear\""));
        let back: ModelParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind(), ModelKind::Linear);
    }
}
