//! Shared domain types.
//!
//! These are plain value objects. Nothing here is shared mutably between
//! fitting trials: every order the search tries gets its own `Estimate`.

use clap::ValueEnum;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// What a captured waveform represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Response to a unit step; differentiated before a general fit.
    Step,
    /// Response to an impulse; fitted as captured.
    Impulse,
}

/// Which linear recurrence the estimator solves for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FitStrategy {
    /// Unconstrained least-squares complex exponential (Prony) fit.
    General,
    /// Fit a step response directly, forcing one discrete root at `z = 1`
    /// (a pole at DC) before solving the least-squares problem.
    StepConstrained,
}

impl FitStrategy {
    pub fn display_name(self) -> &'static str {
        match self {
            FitStrategy::General => "general",
            FitStrategy::StepConstrained => "step-constrained",
        }
    }
}

/// An ordered `(time, amplitude)` series.
///
/// Construction validates the caller contract: equal lengths, finite values,
/// and non-decreasing time. Repeated timestamps are allowed here; the
/// preprocessor removes them.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledResponse {
    times: Vec<f64>,
    amplitudes: Vec<f64>,
}

impl SampledResponse {
    pub fn new(times: Vec<f64>, amplitudes: Vec<f64>) -> Result<Self, AppError> {
        if times.len() != amplitudes.len() {
            return Err(AppError::invalid(format!(
                "Time and amplitude sequences differ in length ({} vs {}).",
                times.len(),
                amplitudes.len()
            )));
        }
        if let Some(i) = times.iter().position(|t| !t.is_finite()) {
            return Err(AppError::invalid(format!("Non-finite time at sample {i}.")));
        }
        if let Some(i) = amplitudes.iter().position(|v| !v.is_finite()) {
            return Err(AppError::invalid(format!("Non-finite amplitude at sample {i}.")));
        }
        if let Some(i) = times.windows(2).position(|w| w[1] < w[0]) {
            return Err(AppError::invalid(format!(
                "Time decreases between samples {i} and {}.",
                i + 1
            )));
        }
        Ok(Self { times, amplitudes })
    }

    /// Build from sequences the caller has already validated.
    pub(crate) fn from_clean(times: Vec<f64>, amplitudes: Vec<f64>) -> Self {
        debug_assert_eq!(times.len(), amplitudes.len());
        Self { times, amplitudes }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn amplitudes(&self) -> &[f64] {
        &self.amplitudes
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Mean spacing, `(t_last - t_first) / (len - 1)`.
    pub fn sample_interval(&self) -> Option<f64> {
        match self.times.as_slice() {
            [first, .., last] => Some((last - first) / (self.times.len() - 1) as f64),
            _ => None,
        }
    }

    /// True if every step is within `rel_tol` of the mean step.
    pub fn is_uniform(&self, rel_tol: f64) -> bool {
        if self.times.len() < 3 {
            return true;
        }
        let span = self.times[self.times.len() - 1] - self.times[0];
        let mean = span / (self.times.len() - 1) as f64;
        if mean <= 0.0 {
            return false;
        }
        self.times
            .windows(2)
            .all(|w| ((w[1] - w[0]) - mean).abs() <= rel_tol * mean)
    }

    /// True if the amplitude takes at most one distinct value.
    pub fn is_constant(&self) -> bool {
        match self.amplitudes.first() {
            Some(first) => self.amplitudes.iter().all(|v| v == first),
            None => true,
        }
    }
}

/// Output of one estimator invocation at a fixed model order.
///
/// For the general strategy `measured`/`reconstructed` are impulse-response
/// samples; for the step-constrained strategy they are step-response samples.
/// `num`/`den` always describe the system transfer function `H(s)`, highest
/// degree first.
#[derive(Debug, Clone)]
pub struct Estimate {
    pub order: usize,
    pub strategy: FitStrategy,
    pub times: Vec<f64>,
    pub measured: Vec<f64>,
    pub reconstructed: Vec<f64>,
    /// Continuous-time poles of the fitted response (rad/s).
    pub poles: Vec<Complex64>,
    pub residues: Vec<Complex64>,
    pub num: Vec<f64>,
    pub den: Vec<f64>,
    pub failed: bool,
}

/// One order tried by the search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub order: usize,
    /// `None` when the correlation was undefined (NaN) or not computed.
    pub rho: Option<f64>,
    pub failed: bool,
}

/// Terminal state of a fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FitStatus {
    /// Correlation exceeded the threshold at `order`.
    Succeeded { order: usize, rho: f64 },
    /// Every order up to `max_order` was tried without meeting the threshold.
    Exhausted { max_order: usize },
    /// The estimator failed at `order` (at or above the abort floor).
    Aborted { order: usize },
    /// No observable dynamics; fitting was skipped.
    Degenerate,
}

impl FitStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, FitStatus::Succeeded { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            FitStatus::Succeeded { .. } => "succeeded",
            FitStatus::Exhausted { .. } => "exhausted",
            FitStatus::Aborted { .. } => "aborted",
            FitStatus::Degenerate => "degenerate",
        }
    }
}

/// How many poles/zeros the caller wants back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoleZeroRequest {
    pub n_poles: usize,
    pub n_zeros: usize,
    /// Overrides `SearchConfig::max_order` for this request.
    pub max_order: Option<usize>,
}

impl PoleZeroRequest {
    pub fn new(n_poles: usize, n_zeros: usize) -> Self {
        Self {
            n_poles,
            n_zeros,
            max_order: None,
        }
    }

    pub fn with_max_order(mut self, max_order: usize) -> Self {
        self.max_order = Some(max_order);
        self
    }
}

/// Final output of the pipeline.
///
/// Pole/zero lists are magnitudes in Hz, padded with `f64::INFINITY` (no
/// finite root) or truncated to the requested counts. JSON export writes the
/// padding as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct FitResult {
    pub status: FitStatus,
    pub kind: ResponseKind,
    pub strategy: FitStrategy,
    /// Model order of the returned estimate (0 when degenerate).
    pub order: usize,
    pub rho: Option<f64>,
    /// Set when the returned estimate is marked failed; `num`/`den` are then
    /// zero-filled and must not be trusted.
    pub failed: bool,
    pub num: Vec<f64>,
    pub den: Vec<f64>,
    pub poles_hz: Vec<f64>,
    pub zeros_hz: Vec<f64>,
    pub trials: Vec<TrialRecord>,
    #[serde(skip)]
    pub estimate: Option<Estimate>,
}
