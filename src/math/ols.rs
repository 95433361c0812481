//! Least squares solver.
//!
//! Solves `minimize ‖y − Xβ‖²` for the linear baseline model, where `X` is the
//! observation-major design matrix (one row per observation, intercept column
//! first).
//!
//! - SVD handles the tall design matrix directly (more observations than
//!   columns). Nalgebra's `QR::solve` is intended for square systems.
//! - Calendar features are near-collinear on short windows (e.g. `is_weekend`
//!   vs. `day_of_week`), so the solve retries with looser singular-value
//!   tolerances before giving up.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Singular values below `tol` are treated as zero. Start strict and relax
    // only when the stricter solve fails or produces non-finite coefficients.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn duplicated_column_still_solves() {
        // Second and third columns identical: minimum-norm solution splits the slope.
        let x = DMatrix::from_row_slice(3, 3, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0]);
        let y = DVector::from_row_slice(&[1.0, 3.0, 5.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 1.0).abs() < 1e-8);
        assert!((beta[1] + beta[2] - 2.0).abs() < 1e-8);
    }
}
