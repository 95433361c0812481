//! Reporting utilities: residuals, error metrics and formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized

pub mod format;

pub use format::*;

use nalgebra::RowDVector;

use crate::domain::{PredictionRow, Timestamp};
use crate::error::AppError;

/// Error summary over a set of predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMetrics {
    pub n: usize,
    pub mae: f64,
    pub rmse: f64,
    /// Mean absolute percentage error over non-zero actuals, in percent.
    pub mape: Option<f64>,
    pub max_abs: f64,
}

impl ErrorMetrics {
    /// `None` when there are no rows.
    pub fn from_rows(rows: &[PredictionRow]) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        let n = rows.len() as f64;
        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        let mut max_abs = 0.0_f64;
        let mut pct_sum = 0.0;
        let mut pct_n = 0usize;

        for r in rows {
            let abs = r.residual.abs();
            abs_sum += abs;
            sq_sum += r.residual * r.residual;
            max_abs = max_abs.max(abs);
            if r.actual != 0.0 {
                pct_sum += abs / r.actual.abs();
                pct_n += 1;
            }
        }

        Some(Self {
            n: rows.len(),
            mae: abs_sum / n,
            rmse: (sq_sum / n).sqrt(),
            mape: (pct_n > 0).then(|| 100.0 * pct_sum / pct_n as f64),
            max_abs,
        })
    }
}

/// Pair actual and predicted load per timestamp; residual is `actual - predicted`.
pub fn compute_residuals(
    timestamps: &[Timestamp],
    actual: &RowDVector<f64>,
    predicted: &RowDVector<f64>,
) -> Result<Vec<PredictionRow>, AppError> {
    if timestamps.len() != actual.len() || actual.len() != predicted.len() {
        return Err(AppError::runtime(format!(
            "Length mismatch: {} timestamps, {} actuals, {} predictions.",
            timestamps.len(),
            actual.len(),
            predicted.len()
        )));
    }

    let mut out = Vec::with_capacity(timestamps.len());
    for ((ts, &a), &p) in timestamps.iter().zip(actual.iter()).zip(predicted.iter()) {
        if !p.is_finite() {
            return Err(AppError::runtime("Non-finite model prediction during residual computation."));
        }
        out.push(PredictionRow {
            timestamp: *ts,
            actual: a,
            predicted: p,
            residual: a - p,
        });
    }
    Ok(out)
}
