//! Command-line parsing for the load forecaster.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code. Every path option can also come from
//! an `LF_*` environment variable (or a `.env` file).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::ModelKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "lf", version, about = "Hourly electric load forecasting from load and weather CSVs")]
pub struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build features, fit on data up to the cutoff, evaluate after it, and
    /// optionally plot/export.
    Run(ForecastArgs),
    /// Score new data with a model saved by `lf run --export-model`.
    Predict(PredictArgs),
    /// Write a synthetic load/weather CSV pair for demos.
    Generate(GenerateArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same pipeline as `lf run`, but renders results in a
    /// terminal UI using Ratatui.
    Tui(ForecastArgs),
}

/// Input files and how to read them.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Load CSV: `timestamp` plus one column per zone.
    #[arg(long = "load", env = "LF_LOAD_CSV", value_name = "CSV")]
    pub load_csv: PathBuf,

    /// Weather CSV: `timestamp` plus `temperature` (pair) or `temperature` + `dew_point`.
    #[arg(long = "weather", env = "LF_WEATHER_CSV", value_name = "CSV")]
    pub weather_csv: PathBuf,

    /// Load column to forecast (case-insensitive).
    #[arg(short = 'z', long, env = "LF_ZONE", default_value = "NYC")]
    pub zone: String,

    /// Offset for timestamps without one, e.g. `-05:00`.
    #[arg(long, env = "LF_UTC_OFFSET", default_value = "-05:00", allow_hyphen_values = true)]
    pub utc_offset: String,
}

/// Options for fitting and evaluating.
#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Last training instant: a date (local midnight) or a date-time.
    #[arg(short = 'c', long, env = "LF_CUTOFF")]
    pub cutoff: String,

    /// Which predictor to fit.
    #[arg(short = 'm', long, value_enum, default_value_t = ModelKind::Network)]
    pub model: ModelKind,

    /// Hidden units of the network.
    #[arg(long, default_value_t = 20)]
    pub hidden: usize,

    /// Maximum training epochs.
    #[arg(long, default_value_t = 1000)]
    pub epochs: usize,

    /// Adam step size.
    #[arg(long, default_value_t = 0.01)]
    pub learning_rate: f64,

    /// Share of training rows held out for early stopping.
    #[arg(long, default_value_t = 0.15)]
    pub validation_fraction: f64,

    /// Epochs without validation improvement before stopping.
    #[arg(long, default_value_t = 6)]
    pub max_fail: usize,

    /// Random seed for weight initialization and the validation split.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export test-window predictions to CSV.
    #[arg(long, env = "LF_EXPORT")]
    pub export: Option<PathBuf>,

    /// Export the fitted model to JSON.
    #[arg(long = "export-model", env = "LF_EXPORT_MODEL")]
    pub export_model: Option<PathBuf>,
}

/// Options for scoring with a saved model.
#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Model JSON produced by `lf run --export-model`.
    #[arg(long = "model-file", env = "LF_MODEL_FILE", value_name = "JSON")]
    pub model_file: PathBuf,

    /// Score records after this instant (defaults to the model's training horizon).
    #[arg(long, conflicts_with = "all")]
    pub from: Option<String>,

    /// Score every record, including the training period.
    #[arg(long)]
    pub all: bool,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export predictions to CSV.
    #[arg(long, env = "LF_EXPORT")]
    pub export: Option<PathBuf>,
}

/// Options for synthetic data.
#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Output directory for `load.csv` and `weather.csv`.
    #[arg(short, long, env = "LF_DATA_DIR", default_value = "data")]
    pub out: PathBuf,

    /// First timestamp (date or date-time).
    #[arg(long, default_value = "2008-01-01")]
    pub start: String,

    /// Number of days to generate.
    #[arg(long, default_value_t = 365)]
    pub days: usize,

    /// Zone column name in the load file.
    #[arg(short = 'z', long, default_value = "NYC")]
    pub zone: String,

    /// Offset for the generated timestamps.
    #[arg(long, default_value = "-05:00", allow_hyphen_values = true)]
    pub utc_offset: String,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Probability an hour is missing from the load file.
    #[arg(long, default_value_t = 0.002)]
    pub load_gap_prob: f64,

    /// Probability an hour has no weather reading.
    #[arg(long, default_value_t = 0.01)]
    pub weather_gap_prob: f64,
}
