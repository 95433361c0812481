//! Least-squares fit of the linear baseline.

use nalgebra::{DMatrix, DVector, RowDVector};

use crate::error::AppError;
use crate::math::solve_least_squares;
use crate::models::LinearModel;

/// Fit `target ≈ intercept + coefficientsᵀ · features` over all columns.
pub fn fit_linear(features: &DMatrix<f64>, target: &RowDVector<f64>) -> Result<LinearModel, AppError> {
    let (d, n) = features.shape();
    if n == 0 || target.len() != n {
        return Err(AppError::no_data(format!(
            "Cannot fit on {n} observations with {} targets.",
            target.len()
        )));
    }
    if n < d + 1 {
        return Err(AppError::no_data(format!(
            "Linear fit needs at least {} observations, got {n}.",
            d + 1
        )));
    }

    // Observation-major design with the intercept column first.
    let design = DMatrix::from_fn(n, d + 1, |i, j| if j == 0 { 1.0 } else { features[(j - 1, i)] });
    let y = DVector::from_row_slice(target.as_slice());

    let beta = solve_least_squares(&design, &y)
        .ok_or_else(|| AppError::runtime("Least squares solve failed (ill-conditioned features)."))?;

    Ok(LinearModel {
        intercept: beta[0],
        coefficients: beta.iter().skip(1).copied().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoadPredictor;

    #[test]
    fn recovers_exact_relation() {
        // y = 5 + 2a - 3b
        let a = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [1.0, 0.0, 2.0, 1.0, 3.0, 0.5];
        let mut values = Vec::new();
        values.extend_from_slice(&a);
        values.extend_from_slice(&b);
        let x = DMatrix::from_row_slice(2, 6, &values);
        let y = RowDVector::from_iterator(6, a.iter().zip(&b).map(|(a, b)| 5.0 + 2.0 * a - 3.0 * b));

        let model = fit_linear(&x, &y).unwrap();
        assert!((model.intercept - 5.0).abs() < 1e-8);
        assert!((model.coefficients[0] - 2.0).abs() < 1e-8);
        assert!((model.coefficients[1] + 3.0).abs() < 1e-8);

        let pred = model.predict(&x).unwrap();
        assert!((pred[3] - y[3]).abs() < 1e-8);
    }

    #[test]
    fn too_few_observations() {
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let y = RowDVector::from_vec(vec![1.0, 2.0]);
        assert!(fit_linear(&x, &y).is_err());
    }
}
