//! Synthetic step/impulse waveforms from a known transfer function.
//!
//! Used by the `synth` command and by tests that need a response with known
//! poles. Noise is i.i.d. Gaussian and fully determined by the seed.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::domain::{ResponseKind, SampledResponse};
use crate::error::{AppError, EXIT_INTERNAL};
use crate::models::{impulse_response, step_response};

/// Recipe for one synthetic waveform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthSpec {
    /// Numerator of `H(s)`, highest degree first.
    pub num: Vec<f64>,
    /// Denominator of `H(s)`, highest degree first.
    pub den: Vec<f64>,
    pub kind: ResponseKind,
    /// Last sample time; samples are evenly spaced on `[0, t_end]`.
    pub t_end: f64,
    pub samples: usize,
    /// Standard deviation of additive noise (0 disables it).
    pub noise_sigma: f64,
    pub seed: u64,
}

impl Default for SynthSpec {
    fn default() -> Self {
        Self {
            num: vec![1.0],
            den: vec![1.0, 1.0],
            kind: ResponseKind::Step,
            t_end: 10.0,
            samples: 200,
            noise_sigma: 0.0,
            seed: 42,
        }
    }
}

pub fn generate_response(spec: &SynthSpec) -> Result<SampledResponse, AppError> {
    if spec.samples < 2 {
        return Err(AppError::invalid("Synthetic waveform needs at least 2 samples."));
    }
    if !(spec.t_end.is_finite() && spec.t_end > 0.0) {
        return Err(AppError::invalid("t_end must be finite and > 0."));
    }
    if !(spec.noise_sigma.is_finite() && spec.noise_sigma >= 0.0) {
        return Err(AppError::invalid("Noise sigma must be finite and >= 0."));
    }

    let dt = spec.t_end / (spec.samples - 1) as f64;
    let times: Vec<f64> = (0..spec.samples).map(|i| i as f64 * dt).collect();
    let mut amplitudes = match spec.kind {
        ResponseKind::Step => step_response(&spec.num, &spec.den, &times)?,
        ResponseKind::Impulse => impulse_response(&spec.num, &spec.den, &times)?,
    };

    if spec.noise_sigma > 0.0 {
        let mut rng = StdRng::seed_from_u64(spec.seed);
        let normal = Normal::new(0.0, spec.noise_sigma)
            .map_err(|e| AppError::new(EXIT_INTERNAL, format!("Noise distribution error: {e}")))?;
        for y in &mut amplitudes {
            *y += normal.sample(&mut rng);
        }
    }

    SampledResponse::new(times, amplitudes)
}
