//! Monotone shaping of sampled transfer curves.
//!
//! Static characteristics captured on hardware (e.g. a DAC code sweep) are
//! monotone in theory but noisy in practice. `make_nondecreasing` projects a
//! sequence onto the closest non-decreasing one in the least-squares sense
//! (pool adjacent violators), and `MonotoneInverse` uses that to build a
//! well-defined `y → x` lookup.

use crate::error::AppError;

/// Closest non-decreasing sequence under squared error.
pub fn make_nondecreasing(ys: &[f64]) -> Vec<f64> {
    // (sum, count) per pooled block.
    let mut blocks: Vec<(f64, usize)> = Vec::with_capacity(ys.len());
    for &y in ys {
        blocks.push((y, 1));
        while blocks.len() >= 2 {
            let (s2, c2) = blocks[blocks.len() - 1];
            let (s1, c1) = blocks[blocks.len() - 2];
            if s1 / c1 as f64 <= s2 / c2 as f64 {
                break;
            }
            blocks.pop();
            if let Some(last) = blocks.last_mut() {
                *last = (s1 + s2, c1 + c2);
            }
        }
    }

    let mut out = Vec::with_capacity(ys.len());
    for (sum, count) in blocks {
        let mean = sum / count as f64;
        out.extend(std::iter::repeat_n(mean, count));
    }
    out
}

/// Piecewise-linear inverse of a sampled monotone function.
#[derive(Debug, Clone, PartialEq)]
pub struct MonotoneInverse {
    /// Non-decreasing knot ordinates; a flat stretch keeps two knots at its
    /// boundaries.
    ys: Vec<f64>,
    xs: Vec<f64>,
}

impl MonotoneInverse {
    /// Build the inverse of `x → y`. The direction (increasing or
    /// decreasing) is taken from the end points and the samples are shaped to
    /// be monotone in that direction. A flat stretch left by the shaping is
    /// reduced to its two boundary points, each placed where the raw samples
    /// cross the plateau level.
    pub fn new(xs: &[f64], ys: &[f64]) -> Result<Self, AppError> {
        if xs.len() != ys.len() {
            return Err(AppError::invalid(format!(
                "x and y differ in length ({} vs {}).",
                xs.len(),
                ys.len()
            )));
        }
        if xs.is_empty() {
            return Err(AppError::new(3, "Cannot invert an empty curve."));
        }
        if xs.iter().chain(ys).any(|v| !v.is_finite()) {
            return Err(AppError::invalid("Curve contains non-finite values."));
        }

        let n = ys.len();
        let decreasing = ys[0] > ys[n - 1];
        let sign = if decreasing { -1.0 } else { 1.0 };
        let raw: Vec<f64> = ys.iter().map(|y| sign * y).collect();
        let shaped = make_nondecreasing(&raw);
        let eps = (shaped[n - 1] - shaped[0]) * 1e-10;

        let mut knot_x = Vec::new();
        let mut knot_y = Vec::new();
        let mut i = 0;
        while i < n {
            let level = shaped[i];
            let mut j = i + 1;
            while j < n && shaped[j] - level <= eps {
                j += 1;
            }
            if j - i == 1 {
                knot_x.push(xs[i]);
                knot_y.push(sign * level);
            } else {
                let start = if i == 0 { xs[0] } else { crossing(xs, &raw, i - 1, level, 1.0) };
                let end = if j == n { xs[n - 1] } else { crossing(xs, &raw, j - 1, level, 0.0) };
                knot_x.extend([start, end]);
                knot_y.extend([sign * level, sign * level]);
            }
            i = j;
        }

        if decreasing {
            knot_x.reverse();
            knot_y.reverse();
        }

        Ok(Self {
            ys: knot_y,
            xs: knot_x,
        })
    }

    /// `x` such that `f(x) = y`; clamps to the end-point abscissae outside
    /// the sampled range.
    pub fn eval(&self, y: f64) -> f64 {
        let n = self.ys.len();
        if n == 1 || y <= self.ys[0] {
            return self.xs[0];
        }
        if y >= self.ys[n - 1] {
            return self.xs[n - 1];
        }
        let hi = self.ys.partition_point(|&k| k < y);
        let lo = hi - 1;
        let frac = (y - self.ys[lo]) / (self.ys[hi] - self.ys[lo]);
        self.xs[lo] + frac * (self.xs[hi] - self.xs[lo])
    }

    pub fn knots(&self) -> (&[f64], &[f64]) {
        (&self.xs, &self.ys)
    }
}

/// Abscissa where the raw segment `k..=k+1` reaches `level`, or the point at
/// `fallback` along the segment when it is flat.
fn crossing(xs: &[f64], raw: &[f64], k: usize, level: f64, fallback: f64) -> f64 {
    let rise = raw[k + 1] - raw[k];
    let frac = if rise == 0.0 {
        fallback
    } else {
        ((level - raw[k]) / rise).clamp(0.0, 1.0)
    };
    xs[k] + frac * (xs[k + 1] - xs[k])
}
