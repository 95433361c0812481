//! Linear baseline: `load = intercept + Σ coefficient_i · feature_i`.

use nalgebra::{DMatrix, RowDVector};

use crate::domain::LinearParams;
use crate::error::AppError;
use crate::models::LoadPredictor;

#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn to_params(&self) -> LinearParams {
        LinearParams {
            intercept: self.intercept,
            coefficients: self.coefficients.clone(),
        }
    }

    pub fn from_params(p: &LinearParams) -> Result<Self, AppError> {
        if p.coefficients.is_empty() {
            return Err(AppError::input("Linear model has no coefficients."));
        }
        Ok(Self {
            intercept: p.intercept,
            coefficients: p.coefficients.clone(),
        })
    }
}

impl LoadPredictor for LinearModel {
    fn predict(&self, features: &DMatrix<f64>) -> Result<RowDVector<f64>, AppError> {
        if features.nrows() != self.coefficients.len() {
            return Err(AppError::input(format!(
                "Linear model expects {} feature rows, got {}.",
                self.coefficients.len(),
                features.nrows()
            )));
        }
        Ok(RowDVector::from_iterator(
            features.ncols(),
            features.column_iter().map(|col| {
                self.intercept
                    + col
                        .iter()
                        .zip(&self.coefficients)
                        .map(|(x, b)| x * b)
                        .sum::<f64>()
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicts_per_column() {
        let m = LinearModel {
            intercept: 1.0,
            coefficients: vec![2.0, -1.0],
        };
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 4.0, 0.0]);
        let y = m.predict(&x).unwrap();
        assert_eq!(y[0], 1.0 + 2.0 - 4.0);
        assert_eq!(y[1], 1.0 + 6.0);
    }
}
