//! Pole/zero post-processing.
//!
//! Downstream regression consumes a fixed number of scalar parameters per
//! waveform, so fitted roots are reduced to:
//!
//! - cyclic frequency (`rad/s → Hz`)
//! - magnitude only; sign and quadrant are discarded, so a growing mode is
//!   indistinguishable from a decaying one with the same rate
//! - exactly the requested count: the smallest-magnitude roots in ascending
//!   order, padded with [`NO_ROOT`]

use std::f64::consts::TAU;

use serde::Serialize;
use tracing::warn;

use crate::math::{roots, trim_leading};

/// Padding value meaning "no finite root".
pub const NO_ROOT: f64 = f64::INFINITY;

/// Leading coefficients below this fraction of the largest are treated as
/// exact zeros; otherwise numerical residue in `num` shows up as a spurious
/// root near infinity.
const LEADING_REL_TOL: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoleZeroSet {
    pub poles_hz: Vec<f64>,
    pub zeros_hz: Vec<f64>,
}

impl PoleZeroSet {
    /// All entries padded, as reported for a response with no observable
    /// dynamics.
    pub fn unobservable(n_poles: usize, n_zeros: usize) -> Self {
        Self {
            poles_hz: vec![NO_ROOT; n_poles],
            zeros_hz: vec![NO_ROOT; n_zeros],
        }
    }
}

/// Root magnitudes of a polynomial, in Hz, unsorted.
pub fn root_magnitudes_hz(coeffs: &[f64]) -> Vec<f64> {
    let coeffs = trim_leading(coeffs, LEADING_REL_TOL);
    match roots(coeffs) {
        Some(r) => r.iter().map(|&z| (z / TAU).norm()).collect(),
        None => {
            warn!(degree = coeffs.len().saturating_sub(1), "polynomial could not be rooted");
            Vec::new()
        }
    }
}

/// Sort ascending, keep at most `n`, and pad with [`NO_ROOT`] up to `n`.
pub fn pad_or_truncate(mut values: Vec<f64>, n: usize) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values.truncate(n);
    values.resize(n, NO_ROOT);
    values
}

/// Poles from `den`, zeros from `num`, reduced to the requested counts.
pub fn extract(num: &[f64], den: &[f64], n_poles: usize, n_zeros: usize) -> PoleZeroSet {
    PoleZeroSet {
        poles_hz: pad_or_truncate(root_magnitudes_hz(den), n_poles),
        zeros_hz: pad_or_truncate(root_magnitudes_hz(num), n_zeros),
    }
}
