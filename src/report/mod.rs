//! Reporting utilities: fit residuals and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::Estimate;

/// Residual summary of a fitted estimate against the data it was fitted to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualStats {
    pub rms: f64,
    pub max_abs: f64,
    pub n: usize,
}

/// `measured - reconstructed` per sample.
pub fn compute_residuals(estimate: &Estimate) -> Vec<f64> {
    estimate
        .measured
        .iter()
        .zip(&estimate.reconstructed)
        .map(|(m, r)| m - r)
        .collect()
}

/// `None` for an empty estimate.
pub fn residual_stats(estimate: &Estimate) -> Option<ResidualStats> {
    let residuals = compute_residuals(estimate);
    if residuals.is_empty() {
        return None;
    }
    let n = residuals.len();
    let sse: f64 = residuals.iter().map(|r| r * r).sum();
    let max_abs = residuals.iter().fold(0.0_f64, |acc, r| acc.max(r.abs()));
    Some(ResidualStats {
        rms: (sse / n as f64).sqrt(),
        max_abs,
        n,
    })
}
