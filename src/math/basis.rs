//! Complex exponential basis.
//!
//! A fitted response is a sum of modes `Σ zᵢ · exp(pᵢ t)`. The residue
//! regression needs the design matrix `Q[i, j] = exp(pⱼ tᵢ)` and
//! reconstruction needs the weighted sum.

use nalgebra::DMatrix;
use num_complex::Complex64;

/// Design matrix with one row per sample time and one column per pole.
pub fn exp_basis(poles: &[Complex64], times: &[f64]) -> DMatrix<Complex64> {
    DMatrix::from_fn(times.len(), poles.len(), |i, j| (poles[j] * times[i]).exp())
}

/// Evaluate `Σ zⱼ · exp(pⱼ t)` at each time and keep the real part.
pub fn reconstruct(poles: &[Complex64], residues: &[Complex64], times: &[f64]) -> Vec<f64> {
    times
        .iter()
        .map(|&t| {
            poles
                .iter()
                .zip(residues)
                .map(|(&p, &z)| z * (p * t).exp())
                .sum::<Complex64>()
                .re
        })
        .collect()
}
