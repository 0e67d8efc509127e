//! Conversions between pole/residue and polynomial forms, and response
//! evaluation of a rational `H(s) = num(s) / den(s)`.

use num_complex::Complex64;

use crate::error::{AppError, EXIT_INTERNAL};
use crate::math::{poly_derivative, poly_eval, poly_from_roots, poly_mul, reconstruct, roots, trim_leading};

/// Relative size below which a leading coefficient is treated as zero.
const LEADING_REL_TOL: f64 = 1e-12;

/// Smallest `|den'(p)| / max|den|` accepted for a simple pole.
const SIMPLE_POLE_TOL: f64 = 1e-9;

/// Polynomial form of `Σ rᵢ / (s − pᵢ)` (no direct term).
///
/// Returns `(num, den)` with `num` of length `n` and `den` of length `n + 1`
/// for `n` poles. Imaginary parts left over after combining conjugate pairs
/// are numerical noise and are dropped.
pub fn invres(residues: &[Complex64], poles: &[Complex64]) -> (Vec<f64>, Vec<f64>) {
    let n = poles.len();
    let den = poly_from_roots(poles);

    let mut num = vec![Complex64::new(0.0, 0.0); n];
    for (i, &r) in residues.iter().enumerate().take(n) {
        let others: Vec<Complex64> = poles
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, &p)| p)
            .collect();
        let term = poly_mul(&poly_from_roots(&others), &[r]);
        // `term` has n coefficients, aligned with `num`.
        for (acc, t) in num.iter_mut().zip(term) {
            *acc += t;
        }
    }

    (
        num.iter().map(|c| c.re).collect(),
        den.iter().map(|c| c.re).collect(),
    )
}

/// Partial-fraction expansion of a strictly proper `num/den` with simple
/// poles. Returns `(residues, poles)`.
pub fn residues(num: &[f64], den: &[f64]) -> Result<(Vec<Complex64>, Vec<Complex64>), AppError> {
    let num = trim_leading(num, LEADING_REL_TOL);
    let den = trim_leading(den, LEADING_REL_TOL);
    if den.len() < 2 {
        return Err(AppError::invalid("Denominator must have degree >= 1."));
    }
    if num.len() >= den.len() {
        return Err(AppError::invalid(format!(
            "Transfer function must be strictly proper (deg num = {}, deg den = {}).",
            num.len().saturating_sub(1),
            den.len() - 1
        )));
    }

    let poles = roots(den).ok_or_else(|| AppError::new(EXIT_INTERNAL, "Failed to root denominator."))?;
    let d_den = poly_derivative(den);
    let scale = den.iter().fold(0.0_f64, |m, c| m.max(c.abs()));

    let mut out = Vec::with_capacity(poles.len());
    for &p in &poles {
        let slope = poly_eval(&d_den, p);
        if slope.norm() <= SIMPLE_POLE_TOL * scale {
            return Err(AppError::new(
                EXIT_INTERNAL,
                format!("Repeated pole near {p}; only simple poles are supported."),
            ));
        }
        out.push(poly_eval(num, p) / slope);
    }
    Ok((out, poles))
}

/// Impulse response of `num/den` at the given times (`t = 0` at the impulse).
pub fn impulse_response(num: &[f64], den: &[f64], times: &[f64]) -> Result<Vec<f64>, AppError> {
    let (res, poles) = residues(num, den)?;
    Ok(reconstruct(&poles, &res, times))
}

/// Unit step response of `num/den`, i.e. the impulse response of
/// `num / (den · s)`.
pub fn step_response(num: &[f64], den: &[f64], times: &[f64]) -> Result<Vec<f64>, AppError> {
    let den = trim_leading(den, LEADING_REL_TOL);
    let mut den_s = den.to_vec();
    den_s.push(0.0);
    impulse_response(num, &den_s, times)
}

/// Normalized frequency response of a pole/zero magnitude set.
///
/// Each finite zero `z` contributes `1 + jf/z` and each finite pole
/// `1 / (1 + jf/p)`; a root at exactly zero contributes `jf` (or `1/jf`).
/// Infinite entries are padding and contribute nothing. Returns
/// `(magnitude, phase_degrees)` per frequency.
pub fn frequency_response(poles_hz: &[f64], zeros_hz: &[f64], freqs_hz: &[f64]) -> Vec<(f64, f64)> {
    freqs_hz
        .iter()
        .map(|&f| {
            let jf = Complex64::new(0.0, f);
            let mut h = Complex64::new(1.0, 0.0);
            for &z in zeros_hz.iter().filter(|z| z.is_finite()) {
                h *= if z == 0.0 { jf } else { jf / z + 1.0 };
            }
            for &p in poles_hz.iter().filter(|p| p.is_finite()) {
                h /= if p == 0.0 { jf } else { jf / p + 1.0 };
            }
            (h.norm(), h.arg().to_degrees())
        })
        .collect()
}
