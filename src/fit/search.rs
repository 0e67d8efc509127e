//! Model-order search.
//!
//! Orders are tried upward from 1. Each trial runs the estimator and scores
//! it against the response it was fitted to:
//!
//! - correlation strictly above the threshold: stop, `Succeeded`
//! - estimator failed at an order `>= abort_min_order`: stop, `Aborted`, and
//!   return that failed estimate (low orders may fail without stopping)
//! - maximum order reached: `Exhausted`, return the last estimate
//!
//! There are no retries beyond moving to the next order.

use tracing::{debug, info, warn};

use crate::domain::{Estimate, FitStatus, SampledResponse, SearchConfig, TrialRecord};
use crate::error::{AppError, EXIT_NO_DATA};
use crate::fit::{estimate, score};

/// Receives every trial the search makes.
pub trait FitObserver {
    fn on_trial(&mut self, trial: &TrialRecord, estimate: &Estimate);
}

impl FitObserver for () {
    fn on_trial(&mut self, _trial: &TrialRecord, _estimate: &Estimate) {}
}

/// Orders tried, in order.
impl FitObserver for Vec<TrialRecord> {
    fn on_trial(&mut self, trial: &TrialRecord, _estimate: &Estimate) {
        self.push(*trial);
    }
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub status: FitStatus,
    pub estimate: Estimate,
    pub rho: Option<f64>,
    pub trials: Vec<TrialRecord>,
}

/// Run the order search on a prepared (uniform) response.
///
/// `max_order` is capped at `response.len() - 1`.
pub fn search_order(
    response: &SampledResponse,
    config: &SearchConfig,
    max_order: usize,
    observer: &mut dyn FitObserver,
) -> Result<SearchOutcome, AppError> {
    if response.len() < 2 {
        return Err(AppError::new(
            EXIT_NO_DATA,
            format!("Need at least 2 samples to fit, got {}.", response.len()),
        ));
    }
    if max_order == 0 {
        return Err(AppError::invalid("max_order must be >= 1."));
    }
    let cap = max_order.min(response.len() - 1);
    if cap < max_order {
        debug!(requested = max_order, cap, "max order limited by sample count");
    }

    let mut trials = Vec::with_capacity(cap);
    let mut last: Option<(Estimate, Option<f64>)> = None;

    for order in 1..=cap {
        let est = estimate(response, order, config.strategy)?;

        if est.failed && order >= config.abort_min_order {
            let trial = TrialRecord {
                order,
                rho: None,
                failed: true,
            };
            observer.on_trial(&trial, &est);
            trials.push(trial);
            warn!(order, "estimator failed; giving up on higher orders");
            return Ok(SearchOutcome {
                status: FitStatus::Aborted { order },
                estimate: est,
                rho: None,
                trials,
            });
        }

        let rho = score(&est);
        let trial = TrialRecord {
            order,
            rho,
            failed: est.failed,
        };
        observer.on_trial(&trial, &est);
        trials.push(trial);
        debug!(order, ?rho, failed = est.failed, "order trial");

        if let Some(r) = rho.filter(|r| *r > config.rho_threshold) {
            info!(order, rho = r, "correlation threshold met");
            return Ok(SearchOutcome {
                status: FitStatus::Succeeded { order, rho: r },
                estimate: est,
                rho,
                trials,
            });
        }

        last = Some((est, rho));
    }

    let Some((estimate, rho)) = last else {
        return Err(AppError::new(EXIT_NO_DATA, "No model order could be tried."));
    };
    warn!(
        max_order = cap,
        ?rho,
        "maximum model order reached without meeting the correlation threshold"
    );
    Ok(SearchOutcome {
        status: FitStatus::Exhausted { max_order: cap },
        estimate,
        rho,
        trials,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FitStrategy;

    fn response(t: &[f64], f: impl Fn(f64) -> f64) -> SampledResponse {
        SampledResponse::new(t.to_vec(), t.iter().map(|&x| f(x)).collect()).unwrap()
    }

    fn config(rho_threshold: f64) -> SearchConfig {
        SearchConfig {
            rho_threshold,
            ..SearchConfig::default()
        }
    }

    #[test]
    fn single_pole_stops_at_first_order() {
        let t: Vec<f64> = (0..30).map(|i| i as f64 * 0.1).collect();
        let r = response(&t, |x| 3.0 * (-1.3 * x).exp());

        let mut seen: Vec<TrialRecord> = Vec::new();
        let out = search_order(&r, &config(0.999), 10, &mut seen).unwrap();

        assert!(matches!(out.status, FitStatus::Succeeded { order: 1, .. }));
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].order, 1);
        assert!((out.estimate.poles[0].re + 1.3).abs() < 1e-9);
    }

    #[test]
    fn unreachable_threshold_exhausts_and_returns_last_order() {
        let t: Vec<f64> = (0..40).map(|i| i as f64 * 0.1).collect();
        let r = response(&t, |x| (-x).exp() - (-3.0 * x).exp());

        let out = search_order(&r, &config(1.0), 2, &mut ()).unwrap();
        assert_eq!(out.status, FitStatus::Exhausted { max_order: 2 });
        assert_eq!(out.estimate.order, 2);
        assert_eq!(out.trials.len(), 2);
        assert!(out.rho.unwrap() > 0.999_999);
    }

    #[test]
    fn max_order_is_capped_by_samples() {
        let r = response(&[0.0, 1.0, 2.0], |x| (-x).exp());
        let out = search_order(&r, &config(1.0), 50, &mut ()).unwrap();
        assert_eq!(out.status, FitStatus::Exhausted { max_order: 2 });
    }

    #[test]
    fn persistent_failure_aborts_at_floor() {
        // An all-zero response makes every order fail.
        let t: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let r = response(&t, |_| 0.0);

        let mut seen: Vec<TrialRecord> = Vec::new();
        let out = search_order(&r, &config(0.999), 8, &mut seen).unwrap();
        assert_eq!(out.status, FitStatus::Aborted { order: 3 });
        assert!(out.estimate.failed);
        assert_eq!(seen.iter().map(|t| t.order).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(seen.iter().all(|t| t.failed && t.rho.is_none()));
    }

    #[test]
    fn abort_floor_is_tunable() {
        let t: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let r = response(&t, |_| 0.0);
        let cfg = SearchConfig {
            abort_min_order: 1,
            ..SearchConfig::default()
        };
        let out = search_order(&r, &cfg, 8, &mut ()).unwrap();
        assert_eq!(out.status, FitStatus::Aborted { order: 1 });
    }

    #[test]
    fn step_constrained_strategy_is_selectable() {
        let t: Vec<f64> = (1..60).map(|i| i as f64 * 0.05).collect();
        let r = response(&t, |x| 1.0 - (-2.0 * x).exp());
        let cfg = SearchConfig {
            strategy: FitStrategy::StepConstrained,
            ..SearchConfig::default()
        };
        let out = search_order(&r, &cfg, 5, &mut ()).unwrap();
        assert!(out.status.is_success());
        assert_eq!(out.estimate.strategy, FitStrategy::StepConstrained);
    }
}
