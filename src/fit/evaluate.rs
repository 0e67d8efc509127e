//! Fit scoring.

use crate::domain::Estimate;
use crate::error::AppError;
use crate::math::pearson;

/// Pearson correlation between a measured and a reconstructed response.
///
/// The result may be NaN (e.g. against an all-zero reconstruction); use
/// [`score`] when a pass/fail decision is needed.
pub fn compare_responses(measured: &[f64], reconstructed: &[f64]) -> Result<f64, AppError> {
    if measured.len() != reconstructed.len() {
        return Err(AppError::invalid(format!(
            "Cannot compare responses of different lengths ({} vs {}).",
            measured.len(),
            reconstructed.len()
        )));
    }
    Ok(pearson(measured, reconstructed))
}

/// Correlation of an estimate against its own input, or `None` if the
/// estimate failed or the correlation is undefined.
pub fn score(estimate: &Estimate) -> Option<f64> {
    if estimate.failed {
        return None;
    }
    compare_responses(&estimate.measured, &estimate.reconstructed)
        .ok()
        .filter(|rho| rho.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FitStrategy;

    fn estimate_with(measured: Vec<f64>, reconstructed: Vec<f64>, failed: bool) -> Estimate {
        Estimate {
            order: 1,
            strategy: FitStrategy::General,
            times: (0..measured.len()).map(|i| i as f64).collect(),
            measured,
            reconstructed,
            poles: Vec::new(),
            residues: Vec::new(),
            num: vec![0.0],
            den: vec![0.0, 0.0],
            failed,
        }
    }

    #[test]
    fn self_correlation_is_one() {
        let h = [0.3, -1.0, 2.5, 0.0, 7.0];
        let rho = compare_responses(&h, &h).unwrap();
        assert!((rho - 1.0).abs() < 1e-15);
    }

    #[test]
    fn length_mismatch_is_a_contract_error() {
        assert!(compare_responses(&[1.0, 2.0], &[1.0]).is_err());
    }

    #[test]
    fn zero_reconstruction_scores_as_failure() {
        let est = estimate_with(vec![1.0, 2.0, 3.0], vec![0.0; 3], false);
        assert!(compare_responses(&est.measured, &est.reconstructed).unwrap().is_nan());
        assert_eq!(score(&est), None);
    }

    #[test]
    fn failed_estimate_has_no_score() {
        let est = estimate_with(vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0], true);
        assert_eq!(score(&est), None);
    }
}
