//! Shared forecast pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest -> join -> features -> split -> fit -> predict -> residuals
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use tracing::info;

use crate::domain::{COL_LOAD, ForecastConfig, LagSpec, ModelFile, PredictionRow, Table, Timestamp, feature_columns};
use crate::error::AppError;
use crate::features::{FeatureMatrix, build_features};
use crate::fit::{FittedModel, fit_model};
use crate::io::{IngestedTable, MODEL_TOOL, load_load_csv, load_weather_csv};
use crate::models::{LoadPredictor, Model};
use crate::report::{ErrorMetrics, compute_residuals};
use crate::table::{inner_join, split_at_cutoff};

/// Row counts at each stage, for the run summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetSummary {
    pub load_rows: usize,
    pub load_row_errors: usize,
    pub weather_rows: usize,
    pub weather_row_errors: usize,
    pub joined_rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Joined, feature-augmented table ready to be split.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub table: Table,
    pub summary: DatasetSummary,
}

/// All computed outputs of a single `lf run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub summary: DatasetSummary,
    pub cutoff: Timestamp,
    pub train: FeatureMatrix,
    pub test: FeatureMatrix,
    pub fitted: FittedModel,
    pub train_metrics: Option<ErrorMetrics>,
    pub predictions: Vec<PredictionRow>,
    pub metrics: ErrorMetrics,
}

/// Outputs of `lf predict` with a saved model.
#[derive(Debug, Clone)]
pub struct PredictOutput {
    pub summary: DatasetSummary,
    pub matrix: FeatureMatrix,
    pub predictions: Vec<PredictionRow>,
    pub metrics: ErrorMetrics,
}

/// Read both CSVs, join them and add calendar and lag features.
pub fn prepare_data(
    load_csv: &std::path::Path,
    weather_csv: &std::path::Path,
    zone: &str,
    offset: chrono::FixedOffset,
    lags: &[LagSpec],
) -> Result<PreparedData, AppError> {
    let load = load_load_csv(load_csv, zone, offset)?;
    let weather = load_weather_csv(weather_csv, offset)?;
    prepare_from_tables(&load, &weather, lags)
}

pub fn prepare_from_tables(
    load: &IngestedTable,
    weather: &IngestedTable,
    lags: &[LagSpec],
) -> Result<PreparedData, AppError> {
    let mut table = inner_join(&load.table, &weather.table)?;
    if table.is_empty() {
        return Err(AppError::no_data(
            "Load and weather tables share no timestamps (empty join).",
        ));
    }

    build_features(&mut table, lags)?;

    let summary = DatasetSummary {
        load_rows: load.table.len(),
        load_row_errors: load.row_errors.len(),
        weather_rows: weather.table.len(),
        weather_row_errors: weather.row_errors.len(),
        joined_rows: table.len(),
        ..DatasetSummary::default()
    };
    info!(
        load = summary.load_rows,
        weather = summary.weather_rows,
        joined = summary.joined_rows,
        "joined inputs"
    );

    Ok(PreparedData { table, summary })
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_forecast(config: &ForecastConfig) -> Result<RunOutput, AppError> {
    let data = prepare_data(
        &config.load_csv,
        &config.weather_csv,
        &config.zone,
        config.utc_offset,
        &config.lags,
    )?;
    run_forecast_with_data(config, &data)
}

/// Execute split -> fit -> predict on already prepared data.
///
/// This is useful for the TUI where we want to refit without re-reading files.
pub fn run_forecast_with_data(config: &ForecastConfig, data: &PreparedData) -> Result<RunOutput, AppError> {
    let (train_table, test_table) = split_at_cutoff(&data.table, config.cutoff)?;
    if train_table.is_empty() {
        return Err(AppError::no_data(format!(
            "No records at or before cutoff {}.",
            config.cutoff
        )));
    }
    if test_table.is_empty() {
        return Err(AppError::no_data(format!("No records after cutoff {}.", config.cutoff)));
    }

    let mut summary = data.summary.clone();
    summary.train_rows = train_table.len();
    summary.test_rows = test_table.len();
    info!(train = summary.train_rows, test = summary.test_rows, cutoff = %config.cutoff, "split");

    let features = feature_columns(&config.lags);
    let train = FeatureMatrix::from_table(&train_table, &features, Some(COL_LOAD))?;
    let test = FeatureMatrix::from_table(&test_table, &features, Some(COL_LOAD))?;
    train.require_observations("training")?;
    test.require_observations("testing")?;

    let fitted = fit_model(config.model, &train, &config.network)?;

    let train_rows = evaluate(&fitted.model, &train)?;
    let train_metrics = ErrorMetrics::from_rows(&train_rows);

    let predictions = evaluate(&fitted.model, &test)?;
    let metrics = ErrorMetrics::from_rows(&predictions)
        .ok_or_else(|| AppError::no_data("No test predictions."))?;
    info!(
        n = metrics.n,
        mae = metrics.mae,
        rmse = metrics.rmse,
        mape = ?metrics.mape,
        "test metrics"
    );

    Ok(RunOutput {
        summary,
        cutoff: config.cutoff,
        train,
        test,
        fitted,
        train_metrics,
        predictions,
        metrics,
    })
}

/// Portable file for the fitted model of a run.
pub fn model_file(config: &ForecastConfig, run: &RunOutput) -> ModelFile {
    ModelFile {
        tool: MODEL_TOOL.to_string(),
        zone: config.zone.clone(),
        trained_through: run.cutoff,
        features: run.train.feature_names.clone(),
        lags: config.lags.iter().map(LagSpec::to_file).collect(),
        params: run.fitted.model.to_params(),
    }
}

/// Apply a saved model to new data.
///
/// Only records strictly after `from` are scored; pass `None` to score all.
pub fn run_predict(
    model_file: &ModelFile,
    data: &PreparedData,
    from: Option<Timestamp>,
) -> Result<PredictOutput, AppError> {
    let model = Model::from_params(&model_file.params)?;

    let table = match from {
        Some(from) => split_at_cutoff(&data.table, from)?.1,
        None => data.table.clone(),
    };
    if table.is_empty() {
        return Err(AppError::no_data("No records to score."));
    }

    let matrix = FeatureMatrix::from_table(&table, &model_file.features, Some(COL_LOAD))?;
    matrix.require_observations("scoring")?;

    let predictions = evaluate(&model, &matrix)?;
    let metrics =
        ErrorMetrics::from_rows(&predictions).ok_or_else(|| AppError::no_data("No predictions."))?;

    let mut summary = data.summary.clone();
    summary.test_rows = table.len();

    Ok(PredictOutput {
        summary,
        matrix,
        predictions,
        metrics,
    })
}

fn evaluate(model: &Model, matrix: &FeatureMatrix) -> Result<Vec<PredictionRow>, AppError> {
    let predicted = model.predict(&matrix.features)?;
    compute_residuals(&matrix.timestamps, matrix.require_target()?, &predicted)
}
