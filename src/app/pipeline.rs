//! Shared pole/zero extraction pipeline used by the CLI and library callers.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! clean -> (differentiate, window, resample) -> order search -> pole/zero reduction
//!
//! Front-ends only deal with getting waveforms in and results out.

use rayon::prelude::*;
use tracing::{info, warn};

use crate::domain::{
    FitConfig, FitResult, FitStatus, FitStrategy, PoleZeroRequest, ResponseKind, SampledResponse,
};
use crate::error::AppError;
use crate::fit::{FitObserver, search_order};
use crate::preprocess::{clean, prepare_for_fit};
use crate::pz::{PoleZeroSet, extract};

/// Identify `H(s)` from one waveform and reduce it to the requested pole and
/// zero magnitudes.
///
/// Responses without observable dynamics (at most one usable sample, or a
/// constant amplitude) short-circuit to fully padded lists with
/// `FitStatus::Degenerate`; that is not an error.
pub fn extract_pole_zeros(
    response: &SampledResponse,
    kind: ResponseKind,
    request: &PoleZeroRequest,
    config: &FitConfig,
    observer: &mut dyn FitObserver,
) -> Result<FitResult, AppError> {
    config.validate()?;
    let strategy = config.search.strategy;
    if strategy == FitStrategy::StepConstrained && kind == ResponseKind::Impulse {
        return Err(AppError::invalid(
            "The step-constrained strategy needs a step response.",
        ));
    }
    let max_order = request.max_order.unwrap_or(config.search.max_order);
    if max_order == 0 {
        return Err(AppError::invalid("max_order must be >= 1."));
    }

    let cleaned = clean(response, &config.preprocess);
    if cleaned.len() <= 1 || cleaned.is_constant() {
        warn!(
            samples = cleaned.len(),
            "no observable dynamics after cleaning; reporting padded poles/zeros"
        );
        return Ok(degenerate(kind, strategy, request));
    }

    let prepared = prepare_for_fit(&cleaned, kind, strategy, &config.preprocess);
    if prepared.len() <= 1 {
        warn!(
            samples = prepared.len(),
            "window left too few samples to fit; reporting padded poles/zeros"
        );
        return Ok(degenerate(kind, strategy, request));
    }

    let outcome = search_order(&prepared, &config.search, max_order, observer)?;
    let estimate = outcome.estimate;
    let pz = extract(&estimate.num, &estimate.den, request.n_poles, request.n_zeros);

    info!(
        status = outcome.status.label(),
        order = estimate.order,
        rho = ?outcome.rho,
        "fit complete"
    );

    Ok(FitResult {
        status: outcome.status,
        kind,
        strategy,
        order: estimate.order,
        rho: outcome.rho,
        failed: estimate.failed,
        num: estimate.num.clone(),
        den: estimate.den.clone(),
        poles_hz: pz.poles_hz,
        zeros_hz: pz.zeros_hz,
        trials: outcome.trials,
        estimate: Some(estimate),
    })
}

/// Run independent pipelines over many waveforms in parallel.
///
/// Results come back in input order, one per waveform.
pub fn fit_batch(
    responses: &[SampledResponse],
    kind: ResponseKind,
    request: &PoleZeroRequest,
    config: &FitConfig,
) -> Vec<Result<FitResult, AppError>> {
    responses
        .par_iter()
        .map(|response| extract_pole_zeros(response, kind, request, config, &mut ()))
        .collect()
}

fn degenerate(kind: ResponseKind, strategy: FitStrategy, request: &PoleZeroRequest) -> FitResult {
    let pz = PoleZeroSet::unobservable(request.n_poles, request.n_zeros);
    FitResult {
        status: FitStatus::Degenerate,
        kind,
        strategy,
        order: 0,
        rho: None,
        failed: false,
        num: Vec::new(),
        den: Vec::new(),
        poles_hz: pz.poles_hz,
        zeros_hz: pz.zeros_hz,
        trials: Vec::new(),
        estimate: None,
    }
}
