//! Least-squares complex exponential (Prony) estimator.
//!
//! For a fixed order `N` and a uniformly sampled response `h[0..M]`:
//!
//! 1. fit a linear recurrence `h[n] = −Σ aⱼ h[n−1−j]` over all `M − N`
//!    complete windows (pseudo-inverse of the lagged-sample matrix)
//! 2. root the characteristic polynomial `zᴺ + a₀zᴺ⁻¹ + … + a_{N−1}`
//! 3. map each discrete root to a continuous pole, `p = ln(z) / Δt`, using
//!    the principal branch of the complex logarithm
//! 4. regress the residues on the exponential basis `exp(pⱼ tᵢ)` (all samples)
//! 5. expand `Σ rⱼ / (s − pⱼ)` into `num / den`
//!
//! The step-constrained variant fits a step response directly and forces one
//! root at `z = 1`. Factoring `(z − 1)` out of the characteristic polynomial
//! turns the problem into an order `N − 1` recurrence on the first
//! difference of the samples, which is what gets solved. The DC pole is then
//! removed from the denominator so `num/den` still describes `H(s)`.
//!
//! Numerical breakdown never escapes as an error: the estimate comes back with
//! `failed = true`, zero-filled coefficients and a zero reconstruction.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use tracing::trace;

use crate::domain::{Estimate, FitStrategy, SampledResponse, MAX_UNIFORM_TOLERANCE};
use crate::error::AppError;
use crate::math::{exp_basis, poly_from_roots, reconstruct, roots, solve_least_squares};
use crate::models::invres;

/// Fit `order` exponential modes to `response`.
///
/// # Errors
/// Contract violations only: `order == 0`, `order >= response.len()`, a
/// non-positive sample interval, or a grid that is not uniform within
/// `MAX_UNIFORM_TOLERANCE`.
pub fn estimate(
    response: &SampledResponse,
    order: usize,
    strategy: FitStrategy,
) -> Result<Estimate, AppError> {
    let m = response.len();
    if order == 0 {
        return Err(AppError::invalid("Model order must be >= 1."));
    }
    if order >= m {
        return Err(AppError::invalid(format!(
            "Model order {order} must be smaller than the sample count {m}."
        )));
    }
    let dt = response
        .sample_interval()
        .filter(|dt| *dt > 0.0 && dt.is_finite())
        .ok_or_else(|| AppError::invalid("Sample interval must be positive."))?;
    if !response.is_uniform(MAX_UNIFORM_TOLERANCE) {
        return Err(AppError::invalid(
            "Time grid is not uniform; resample before estimating.",
        ));
    }

    let times = response.times();
    let h = response.amplitudes();

    match solve_modes(h, times, dt, order, strategy) {
        Some(modes) => Ok(assemble(response, order, strategy, modes)),
        None => {
            trace!(order, strategy = strategy.display_name(), "estimator failed");
            Ok(failed_estimate(response, order, strategy))
        }
    }
}

/// Least-squares coefficients `a` of the order-`n` recurrence
/// `seq[k] = −Σⱼ aⱼ seq[k−1−j]`.
pub fn recurrence_coefficients(seq: &[f64], n: usize) -> Option<Vec<f64>> {
    if n == 0 || seq.len() <= n {
        return None;
    }
    let rows = seq.len() - n;
    // Row k holds seq[k+n-1], seq[k+n-2], ..., seq[k] (Toeplitz).
    let lagged = DMatrix::from_fn(rows, n, |k, j| seq[k + n - 1 - j]);
    let target = DVector::from_fn(rows, |k, _| seq[k + n]);
    let a = solve_least_squares(&lagged, &target)?;
    Some(a.iter().map(|v| -v).collect())
}

struct Modes {
    poles: Vec<Complex64>,
    residues: Vec<Complex64>,
}

fn solve_modes(
    h: &[f64],
    times: &[f64],
    dt: f64,
    order: usize,
    strategy: FitStrategy,
) -> Option<Modes> {
    let discrete_roots = match strategy {
        FitStrategy::General => {
            let a = recurrence_coefficients(h, order)?;
            roots(&characteristic(&a))?
        }
        FitStrategy::StepConstrained => {
            let mut r = if order == 1 {
                Vec::new()
            } else {
                let diff: Vec<f64> = h.windows(2).map(|w| w[1] - w[0]).collect();
                let a = recurrence_coefficients(&diff, order - 1)?;
                roots(&characteristic(&a))?
            };
            // Exactly 1 so the DC pole comes out as exactly 0.
            r.push(Complex64::new(1.0, 0.0));
            r
        }
    };

    let poles: Vec<Complex64> = discrete_roots.iter().map(|z| z.ln() / dt).collect();
    if poles.iter().any(|p| !(p.re.is_finite() && p.im.is_finite())) {
        return None;
    }

    let basis = exp_basis(&poles, times);
    let samples = DVector::from_iterator(h.len(), h.iter().map(|&v| Complex64::new(v, 0.0)));
    let residues = solve_least_squares(&basis, &samples)?;

    Some(Modes {
        poles,
        residues: residues.iter().copied().collect(),
    })
}

/// `[1, a₀, …, a_{n−1}]`.
fn characteristic(a: &[f64]) -> Vec<f64> {
    std::iter::once(1.0).chain(a.iter().copied()).collect()
}

fn assemble(
    response: &SampledResponse,
    order: usize,
    strategy: FitStrategy,
    modes: Modes,
) -> Estimate {
    let times = response.times();
    let reconstructed = reconstruct(&modes.poles, &modes.residues, times);
    if reconstructed.iter().any(|v| !v.is_finite()) {
        return failed_estimate(response, order, strategy);
    }

    let (num, mut den) = invres(&modes.residues, &modes.poles);
    if strategy == FitStrategy::StepConstrained {
        // Y(s) = num / (s · D(s))  =>  H(s) = s · Y(s) = num / D(s).
        let dynamic = &modes.poles[..modes.poles.len() - 1];
        den = poly_from_roots(dynamic).iter().map(|c| c.re).collect();
    }

    Estimate {
        order,
        strategy,
        times: times.to_vec(),
        measured: response.amplitudes().to_vec(),
        reconstructed,
        poles: modes.poles,
        residues: modes.residues,
        num,
        den,
        failed: false,
    }
}

fn failed_estimate(response: &SampledResponse, order: usize, strategy: FitStrategy) -> Estimate {
    let den_len = match strategy {
        FitStrategy::General => order + 1,
        FitStrategy::StepConstrained => order,
    };
    Estimate {
        order,
        strategy,
        times: response.times().to_vec(),
        measured: response.amplitudes().to_vec(),
        reconstructed: vec![0.0; response.len()],
        poles: Vec::new(),
        residues: Vec::new(),
        num: vec![0.0; order],
        den: vec![0.0; den_len],
        failed: true,
    }
}
