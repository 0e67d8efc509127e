//! Least squares through the Moore–Penrose pseudo-inverse.
//!
//! Both systems the estimator solves are tall and can be badly conditioned:
//!
//! - the lagged-sample (Toeplitz) system for the recurrence coefficients
//! - the exponential-basis system for the residues (complex)
//!
//! We solve them with an SVD and drop singular values below
//! `RCOND * σ_max`, which is exactly `pinv(X) · y` with NumPy's default
//! cutoff. Rank-deficient systems therefore yield the minimum-norm solution
//! instead of an error.

use nalgebra::{ComplexField, DMatrix, DVector};

/// Relative singular-value cutoff.
const RCOND: f64 = 1e-15;

/// Iteration cap for the SVD. Without it a NaN-contaminated matrix never
/// converges.
const MAX_SVD_ITERS: usize = 10_000;

/// Solve `min ‖X β − y‖₂` for real or complex `X`.
///
/// Returns `None` if the input contains non-finite values, the SVD does not
/// converge, or the solution is not finite.
pub fn solve_least_squares<T>(x: &DMatrix<T>, y: &DVector<T>) -> Option<DVector<T>>
where
    T: ComplexField<RealField = f64>,
{
    if x.nrows() == 0 || x.ncols() == 0 || x.nrows() != y.len() {
        return None;
    }
    if !x.iter().all(|v| v.is_finite()) || !y.iter().all(|v| v.is_finite()) {
        return None;
    }

    let svd = x.clone().try_svd(true, true, f64::EPSILON, MAX_SVD_ITERS)?;
    let tol = svd.singular_values.max() * RCOND;
    let beta = svd.solve(y, tol).ok()?;

    if beta.iter().all(|v| v.is_finite()) {
        Some(beta)
    } else {
        None
    }
}
