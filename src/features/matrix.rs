//! Feature export for model consumption.
//!
//! The model sees one row per feature and one column per observation. Rows
//! follow the requested feature order; the target is a single row of load
//! values. Observations with any missing feature (or a missing target) cannot
//! be fed to a model and are skipped; the timestamps of kept observations are
//! retained so predictions can be aligned back to time.

use nalgebra::{DMatrix, RowDVector};

use crate::domain::{Table, Timestamp};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub feature_names: Vec<String>,
    /// `features.nrows() == feature_names.len()`, one column per observation.
    pub features: DMatrix<f64>,
    /// Present only when the table carried the target column.
    pub target: Option<RowDVector<f64>>,
    pub timestamps: Vec<Timestamp>,
    /// Records dropped for missing values.
    pub skipped: usize,
}

impl FeatureMatrix {
    /// Extract `feature_names` (and `target`, if given) from `table`.
    pub fn from_table(table: &Table, feature_names: &[String], target: Option<&str>) -> Result<Self, AppError> {
        let feature_idx = feature_names
            .iter()
            .map(|name| table.require_column(name))
            .collect::<Result<Vec<_>, _>>()?;
        let target_idx = target.map(|name| table.require_column(name)).transpose()?;

        let mut columns: Vec<f64> = Vec::with_capacity(table.len() * feature_idx.len());
        let mut targets = Vec::with_capacity(table.len());
        let mut timestamps = Vec::with_capacity(table.len());
        let mut skipped = 0usize;

        for record in table.records() {
            let row: Option<Vec<f64>> = feature_idx.iter().map(|&i| record.values[i]).collect();
            let Some(row) = row else {
                skipped += 1;
                continue;
            };
            let y = match target_idx {
                Some(i) => match record.values[i] {
                    Some(y) => Some(y),
                    None => {
                        skipped += 1;
                        continue;
                    }
                },
                None => None,
            };

            columns.extend(row);
            if let Some(y) = y {
                targets.push(y);
            }
            timestamps.push(record.timestamp);
        }

        // Column-major storage: each observation is a contiguous column.
        let features = DMatrix::from_column_slice(feature_idx.len(), timestamps.len(), &columns);
        let target = target_idx.map(|_| RowDVector::from_vec(targets));

        Ok(Self {
            feature_names: feature_names.to_vec(),
            features,
            target,
            timestamps,
            skipped,
        })
    }

    pub fn n_obs(&self) -> usize {
        self.features.ncols()
    }

    pub fn n_features(&self) -> usize {
        self.features.nrows()
    }

    pub fn require_target(&self) -> Result<&RowDVector<f64>, AppError> {
        self.target
            .as_ref()
            .ok_or_else(|| AppError::input("Feature matrix has no target row."))
    }

    pub fn require_observations(&self, label: &str) -> Result<(), AppError> {
        if self.n_obs() == 0 {
            return Err(AppError::no_data(format!(
                "No complete {label} observations ({} skipped for missing values).",
                self.skipped
            )));
        }
        Ok(())
    }
}
