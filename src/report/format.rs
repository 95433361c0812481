//! Formatted terminal output for runs and predictions.

use crate::app::pipeline::{DatasetSummary, PredictOutput, RunOutput};
use crate::domain::{ForecastConfig, ModelFile};
use crate::fit::StopReason;
use crate::report::ErrorMetrics;

/// Format the full run summary (dataset sizes + fit diagnostics + test metrics).
pub fn format_run_summary(run: &RunOutput, config: &ForecastConfig) -> String {
    let mut out = String::new();

    out.push_str("=== lf - Load Forecast ===\n");
    out.push_str(&format!("Zone: {}\n", config.zone));
    out.push_str(&format!("Cutoff: {} (train <= cutoff < test)\n", run.cutoff.to_rfc3339()));
    out.push_str(&format_dataset(&run.summary));
    out.push_str(&format!(
        "Observations: train={} test={} (skipped incomplete: train={} test={})\n",
        run.train.n_obs(),
        run.test.n_obs(),
        run.train.skipped,
        run.test.skipped,
    ));
    out.push_str(&format!("Features: {}\n", run.train.feature_names.join(", ")));
    out.push('\n');

    out.push_str(&format!("Model: {}\n", run.fitted.model.kind().display_name()));
    if let Some(report) = &run.fitted.training {
        let stop = match report.stop {
            StopReason::MaxEpochs => "max epochs",
            StopReason::ValidationFailures => "validation stop",
        };
        out.push_str(&format!(
            "Training: hidden={} epochs={} best_epoch={} ({stop}) train_mse={:.5}",
            config.network.hidden, report.epochs_run, report.best_epoch, report.train_mse,
        ));
        if let Some(v) = report.validation_mse {
            out.push_str(&format!(" val_mse={v:.5} (n_val={})", report.n_validation));
        }
        out.push('\n');
    }
    if let Some(m) = &run.train_metrics {
        out.push_str(&format!("Train {}\n", format_metrics(m)));
    }
    out.push_str(&format!("Test  {}\n", format_metrics(&run.metrics)));

    out
}

/// Format the summary of a saved-model prediction.
pub fn format_predict_summary(output: &PredictOutput, model: &ModelFile) -> String {
    let mut out = String::new();
    out.push_str("=== lf - Load Forecast (saved model) ===\n");
    out.push_str(&format!("Zone: {}\n", model.zone));
    out.push_str(&format!("Model: {}\n", model.params.kind().display_name()));
    out.push_str(&format!("Trained through: {}\n", model.trained_through.to_rfc3339()));
    out.push_str(&format_dataset(&output.summary));
    out.push_str(&format!(
        "Scored: {} (skipped incomplete: {})\n",
        output.matrix.n_obs(),
        output.matrix.skipped
    ));
    out.push_str(&format!("{}\n", format_metrics(&output.metrics)));
    out
}

pub fn format_metrics(m: &ErrorMetrics) -> String {
    let mape = m
        .mape
        .map(|v| format!("{v:.2}%"))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "n={} MAE={:.2} RMSE={:.2} MAPE={mape} max|err|={:.2}",
        m.n, m.mae, m.rmse, m.max_abs
    )
}

fn format_dataset(s: &DatasetSummary) -> String {
    let mut out = format!(
        "Rows: load={} weather={} joined={}",
        s.load_rows, s.weather_rows, s.joined_rows
    );
    if s.train_rows + s.test_rows > 0 {
        out.push_str(&format!(" train={} test={}", s.train_rows, s.test_rows));
    }
    out.push('\n');
    if s.load_row_errors + s.weather_row_errors > 0 {
        out.push_str(&format!(
            "Skipped rows: load={} weather={}\n",
            s.load_row_errors, s.weather_row_errors
        ));
    }
    out
}
