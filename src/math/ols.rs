//! Small linear least squares solver.
//!
//! The dependency functions `a + b * g(x, c)` are linear in `(a, b)` once `c`
//! is fixed, so the curve fitter seeds its nonlinear refinement by solving
//!
//! ```text
//! minimize Σ (y_i - a - b * g(x_i, c))^2
//! ```
//!
//! for many candidate `c` values. The design matrix is tall (one row per
//! interval, two columns) and can be rank deficient (e.g. `c = 0` for the
//! power law makes both columns constant), so we solve through SVD.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if no finite solution is found.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Progressively looser singular-value cutoffs for nearly collinear columns.
    for &tol in &[1e-12, 1e-10, 1e-8] {
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
        // y = 2 + 3x on x = [0, 1, 2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn collinear_columns_still_solve() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let y = DVector::from_row_slice(&[4.0, 4.0, 4.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] + beta[1] - 4.0).abs() < 1e-9);
    }
}
