//! Cleaning, differentiation and windowing of sampled responses.

use tracing::debug;

use crate::domain::{FitStrategy, PreprocessConfig, ResponseKind, SampledResponse};

/// Collapse runs of identical timestamps, keeping the last amplitude of each
/// run. Simulators emit these around breakpoints.
pub fn remove_repeated_timesteps(response: &SampledResponse) -> SampledResponse {
    let mut times: Vec<f64> = Vec::with_capacity(response.len());
    let mut amplitudes: Vec<f64> = Vec::with_capacity(response.len());

    for (&t, &h) in response.times().iter().zip(response.amplitudes()) {
        if times.last() == Some(&t) {
            if let Some(prev) = amplitudes.last_mut() {
                *prev = h;
            }
        } else {
            times.push(t);
            amplitudes.push(h);
        }
    }

    SampledResponse::from_clean(times, amplitudes)
}

/// Drop leading samples up to (and including) the last one with `t <= 0`.
pub fn drop_nonpositive_time(response: &SampledResponse) -> SampledResponse {
    let start = response
        .times()
        .iter()
        .position(|&t| t > 0.0)
        .unwrap_or(response.len());
    slice_response(response, start, response.len())
}

/// Discard the first `n` samples.
pub fn crop_leading(response: &SampledResponse, n: usize) -> SampledResponse {
    let start = n.min(response.len());
    slice_response(response, start, response.len())
}

/// Finite-difference derivative, stamped at the midpoint of each pair.
///
/// Expects strictly increasing time (run `remove_repeated_timesteps` first).
pub fn differentiate(response: &SampledResponse) -> SampledResponse {
    let t = response.times();
    let h = response.amplitudes();

    let (times, amplitudes): (Vec<f64>, Vec<f64>) = t
        .windows(2)
        .zip(h.windows(2))
        .map(|(tw, hw)| {
            let dt = tw[1] - tw[0];
            (tw[0] + dt / 2.0, (hw[1] - hw[0]) / dt)
        })
        .unzip();

    SampledResponse::from_clean(times, amplitudes)
}

/// Crop an impulse response to `[first peak, last sample above floor·peak]`.
///
/// An all-zero response is returned unchanged.
pub fn window_impulse(response: &SampledResponse, floor: f64) -> SampledResponse {
    let h = response.amplitudes();
    let mut peak_idx = 0;
    let mut peak = 0.0_f64;
    for (i, v) in h.iter().enumerate() {
        if v.abs() > peak {
            peak = v.abs();
            peak_idx = i;
        }
    }
    if peak == 0.0 {
        return response.clone();
    }

    let cutoff = floor * peak;
    let last = h
        .iter()
        .rposition(|v| v.abs() > cutoff)
        .unwrap_or(peak_idx)
        .max(peak_idx);

    slice_response(response, peak_idx, last + 1)
}

/// Linear interpolation onto a uniform grid with the same sample count and
/// end points.
pub fn resample_uniform(response: &SampledResponse) -> SampledResponse {
    let n = response.len();
    if n < 3 {
        return response.clone();
    }
    let t = response.times();
    let h = response.amplitudes();
    let t0 = t[0];
    let step = (t[n - 1] - t0) / (n - 1) as f64;

    let mut times = Vec::with_capacity(n);
    let mut amplitudes = Vec::with_capacity(n);
    let mut seg = 0;
    for i in 0..n {
        let ti = if i == n - 1 { t[n - 1] } else { t0 + step * i as f64 };
        while seg + 2 < n && t[seg + 1] < ti {
            seg += 1;
        }
        let (ta, tb) = (t[seg], t[seg + 1]);
        let frac = if tb > ta { (ti - ta) / (tb - ta) } else { 0.0 };
        times.push(ti);
        amplitudes.push(h[seg] + frac * (h[seg + 1] - h[seg]));
    }

    SampledResponse::from_clean(times, amplitudes)
}

/// Deduplicate, drop non-positive times, and crop start-up samples.
pub fn clean(response: &SampledResponse, config: &PreprocessConfig) -> SampledResponse {
    let mut out = remove_repeated_timesteps(response);
    if out.len() != response.len() {
        debug!(
            removed = response.len() - out.len(),
            "collapsed repeated timesteps"
        );
    }
    if config.drop_nonpositive_time {
        out = drop_nonpositive_time(&out);
    }
    crop_leading(&out, config.crop_leading)
}

/// Shape a cleaned response into what the estimator fits.
///
/// The general strategy fits an impulse response: step responses are
/// differentiated and the derivative is windowed; impulse responses are
/// fitted as captured. The step-constrained strategy fits the step response
/// as captured.
///
/// The estimator needs a uniform grid, so a grid that is not uniform within
/// `uniform_tolerance` is always resampled; `resample` forces it regardless.
pub fn prepare_for_fit(
    cleaned: &SampledResponse,
    kind: ResponseKind,
    strategy: FitStrategy,
    config: &PreprocessConfig,
) -> SampledResponse {
    let mut out = match (strategy, kind) {
        (FitStrategy::General, ResponseKind::Step) => {
            window_impulse(&differentiate(cleaned), config.window_floor)
        }
        (FitStrategy::General, ResponseKind::Impulse) | (FitStrategy::StepConstrained, _) => {
            cleaned.clone()
        }
    };

    if config.resample {
        out = resample_uniform(&out);
    } else if !out.is_uniform(config.uniform_tolerance) {
        debug!(samples = out.len(), "time grid is not uniform; resampling");
        out = resample_uniform(&out);
    }
    out
}

fn slice_response(response: &SampledResponse, start: usize, end: usize) -> SampledResponse {
    SampledResponse::from_clean(
        response.times()[start..end].to_vec(),
        response.amplitudes()[start..end].to_vec(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(t: &[f64], h: &[f64]) -> SampledResponse {
        SampledResponse::new(t.to_vec(), h.to_vec()).unwrap()
    }

    #[test]
    fn repeated_timesteps_keep_last_value() {
        let r = response(&[0.0, 1.0, 1.0, 1.0, 2.0], &[0.0, 1.0, 2.0, 3.0, 4.0]);
        let out = remove_repeated_timesteps(&r);
        assert_eq!(out.times(), &[0.0, 1.0, 2.0]);
        assert_eq!(out.amplitudes(), &[0.0, 3.0, 4.0]);
    }

    #[test]
    fn nonpositive_times_are_dropped() {
        let r = response(&[-1.0, 0.0, 0.5, 1.0], &[9.0, 8.0, 1.0, 2.0]);
        let out = drop_nonpositive_time(&r);
        assert_eq!(out.times(), &[0.5, 1.0]);
        assert_eq!(out.amplitudes(), &[1.0, 2.0]);
    }

    #[test]
    fn crop_past_end_is_empty() {
        let r = response(&[0.0, 1.0], &[1.0, 2.0]);
        assert!(crop_leading(&r, 5).is_empty());
        assert_eq!(crop_leading(&r, 1).times(), &[1.0]);
    }

    #[test]
    fn derivative_uses_midpoints() {
        let r = response(&[0.0, 1.0, 3.0], &[0.0, 2.0, 3.0]);
        let d = differentiate(&r);
        assert_eq!(d.times(), &[0.5, 2.0]);
        assert_eq!(d.amplitudes(), &[2.0, 0.5]);
    }

    #[test]
    fn window_starts_at_peak_and_drops_quiet_tail() {
        let r = response(
            &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            &[0.1, -2.0, 1.0, 0.01, 0.001, 0.0],
        );
        let w = window_impulse(&r, 1e-3);
        assert_eq!(w.times(), &[1.0, 2.0, 3.0]);
        assert_eq!(w.amplitudes(), &[-2.0, 1.0, 0.01]);
    }

    #[test]
    fn window_uses_first_peak_on_ties() {
        let r = response(&[0.0, 1.0, 2.0], &[1.0, 1.0, 0.5]);
        assert_eq!(window_impulse(&r, 1e-3).len(), 3);
    }

    #[test]
    fn resample_is_uniform_and_linear() {
        let r = response(&[0.0, 0.1, 0.4, 1.0], &[0.0, 1.0, 4.0, 10.0]);
        let out = resample_uniform(&r);
        assert!(out.is_uniform(1e-9));
        for (t, h) in out.times().iter().zip(out.amplitudes()) {
            assert!((h - 10.0 * t).abs() < 1e-12);
        }
    }

    #[test]
    fn non_uniform_grid_is_resampled_without_the_flag() {
        let t: Vec<f64> = (0..40).map(|i| (0.02 * i as f64).powf(1.1)).collect();
        let h: Vec<f64> = t.iter().map(|x| (-2.0 * x).exp()).collect();
        let config = PreprocessConfig::default();
        assert!(!config.resample);

        let out = prepare_for_fit(&response(&t, &h), ResponseKind::Impulse, FitStrategy::General, &config);
        assert!(out.is_uniform(1e-9));
        assert_eq!(out.len(), t.len());
        assert_eq!(out.times()[0], t[0]);
        assert_eq!(out.times()[39], t[39]);
    }

    #[test]
    fn impulse_is_not_windowed() {
        let t: Vec<f64> = (0..10).map(f64::from).collect();
        let h: Vec<f64> = t.iter().map(|x| 5.0 * (-0.7 * x).exp() - 4.0 * (-0.3 * x).exp()).collect();
        let r = response(&t, &h);
        let out = prepare_for_fit(&r, ResponseKind::Impulse, FitStrategy::General, &PreprocessConfig::default());
        assert_eq!(out, r);
    }

    #[test]
    fn clean_applies_every_step() {
        let config = PreprocessConfig {
            crop_leading: 1,
            ..PreprocessConfig::default()
        };
        let r = response(&[0.0, 1.0, 1.0, 2.0, 3.0], &[5.0, 1.0, 2.0, 3.0, 4.0]);
        let out = clean(&r, &config);
        assert_eq!(out.times(), &[2.0, 3.0]);
        assert_eq!(out.amplitudes(), &[3.0, 4.0]);
    }
}
