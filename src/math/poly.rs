//! Polynomial helpers.
//!
//! Coefficients are stored highest degree first, as in `num`/`den` of a
//! transfer function: `[c0, c1, ..., cn]` is `c0·sⁿ + c1·sⁿ⁻¹ + ... + cn`.

use nalgebra::DMatrix;
use nalgebra::linalg::Schur;
use num_complex::Complex64;

const MAX_SCHUR_ITERS: usize = 10_000;

/// Monic polynomial with the given roots.
pub fn poly_from_roots(roots: &[Complex64]) -> Vec<Complex64> {
    let mut out = vec![Complex64::new(1.0, 0.0)];
    for &r in roots {
        out = poly_mul(&out, &[Complex64::new(1.0, 0.0), -r]);
    }
    out
}

/// Product of two polynomials.
pub fn poly_mul(a: &[Complex64], b: &[Complex64]) -> Vec<Complex64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![Complex64::new(0.0, 0.0); a.len() + b.len() - 1];
    for (i, &ai) in a.iter().enumerate() {
        for (j, &bj) in b.iter().enumerate() {
            out[i + j] += ai * bj;
        }
    }
    out
}

/// Evaluate a real-coefficient polynomial at a complex point (Horner).
pub fn poly_eval(coeffs: &[f64], x: Complex64) -> Complex64 {
    coeffs
        .iter()
        .fold(Complex64::new(0.0, 0.0), |acc, &c| acc * x + c)
}

/// Derivative of a real-coefficient polynomial.
pub fn poly_derivative(coeffs: &[f64]) -> Vec<f64> {
    let n = coeffs.len();
    if n <= 1 {
        return vec![0.0];
    }
    coeffs[..n - 1]
        .iter()
        .enumerate()
        .map(|(i, &c)| c * (n - 1 - i) as f64)
        .collect()
}

/// Drop leading coefficients whose magnitude is at most `rel_tol` times the
/// largest coefficient. An all-zero polynomial becomes empty.
pub fn trim_leading(coeffs: &[f64], rel_tol: f64) -> &[f64] {
    let scale = coeffs.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
    if scale == 0.0 {
        return &[];
    }
    let start = coeffs
        .iter()
        .position(|c| c.abs() > rel_tol * scale)
        .unwrap_or(coeffs.len());
    &coeffs[start..]
}

/// Roots of a real-coefficient polynomial.
///
/// Exact leading zeros are ignored and exact trailing zeros become roots at
/// the origin; the rest are eigenvalues of the companion matrix. Returns
/// `None` if the eigen-decomposition does not converge or a coefficient is
/// not finite.
pub fn roots(coeffs: &[f64]) -> Option<Vec<Complex64>> {
    if coeffs.iter().any(|c| !c.is_finite()) {
        return None;
    }
    let Some(first) = coeffs.iter().position(|&c| c != 0.0) else {
        return Some(Vec::new());
    };
    let Some(last) = coeffs.iter().rposition(|&c| c != 0.0) else {
        return Some(Vec::new());
    };

    let core = &coeffs[first..=last];
    let n_zero_roots = coeffs.len() - 1 - last;
    let degree = core.len() - 1;

    let mut out = Vec::with_capacity(degree + n_zero_roots);
    if degree > 0 {
        let lead = core[0];
        let companion = DMatrix::<f64>::from_fn(degree, degree, |i, j| {
            if i == 0 {
                -core[j + 1] / lead
            } else if i == j + 1 {
                1.0
            } else {
                0.0
            }
        });
        let schur = Schur::try_new(companion, f64::EPSILON, MAX_SCHUR_ITERS)?;
        out.extend(schur.complex_eigenvalues().iter().copied());
    }
    out.extend(std::iter::repeat_n(Complex64::new(0.0, 0.0), n_zero_roots));

    if out.iter().all(|r| r.re.is_finite() && r.im.is_finite()) {
        Some(out)
    } else {
        None
    }
}
