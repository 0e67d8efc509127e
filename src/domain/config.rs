//! Run configuration.
//!
//! Values are layered: built-in defaults, then environment variables (a `.env`
//! file is honored through `dotenvy`), then whatever the CLI sets explicitly.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::FitStrategy;
use crate::error::AppError;

/// Loosest relative step tolerance under which a grid still counts as
/// uniform. The estimator rejects anything coarser.
pub const MAX_UNIFORM_TOLERANCE: f64 = 1e-3;

/// Response cleaning knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Samples dropped from the front after deduplication (start-up and
    /// clock-feedthrough artifacts). Not self-calibrating.
    pub crop_leading: usize,
    /// Drop leading samples with `t <= 0` before cropping.
    pub drop_nonpositive_time: bool,
    /// Fraction of the peak magnitude below which the impulse tail is cut.
    pub window_floor: f64,
    /// Always resample onto a uniform grid before fitting. Grids that are not
    /// uniform within `uniform_tolerance` are resampled either way.
    pub resample: bool,
    /// Relative step tolerance for treating a grid as uniform, at most
    /// `MAX_UNIFORM_TOLERANCE`.
    pub uniform_tolerance: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            crop_leading: 0,
            drop_nonpositive_time: true,
            window_floor: 1e-3,
            resample: false,
            uniform_tolerance: 1e-6,
        }
    }
}

/// Order-search knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Stop as soon as the correlation strictly exceeds this value.
    pub rho_threshold: f64,
    /// Highest model order tried.
    pub max_order: usize,
    /// Estimator failures below this order are tolerated; at or above it the
    /// search aborts.
    pub abort_min_order: usize,
    pub strategy: FitStrategy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            rho_threshold: 0.999,
            max_order: 50,
            abort_min_order: 3,
            strategy: FitStrategy::General,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    pub preprocess: PreprocessConfig,
    pub search: SearchConfig,
}

pub const ENV_RHO_THRESHOLD: &str = "MODALFIT_RHO_THRESHOLD";
pub const ENV_MAX_ORDER: &str = "MODALFIT_MAX_ORDER";
pub const ENV_ABORT_MIN_ORDER: &str = "MODALFIT_ABORT_MIN_ORDER";
pub const ENV_STRATEGY: &str = "MODALFIT_STRATEGY";
pub const ENV_CROP_LEADING: &str = "MODALFIT_CROP_LEADING";
pub const ENV_WINDOW_FLOOR: &str = "MODALFIT_WINDOW_FLOOR";
pub const ENV_RESAMPLE: &str = "MODALFIT_RESAMPLE";

impl FitConfig {
    /// Defaults overlaid with `MODALFIT_*` variables from the process
    /// environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_RHO_THRESHOLD) {
            self.search.rho_threshold = parse_value(ENV_RHO_THRESHOLD, &v)?;
        }
        if let Some(v) = lookup(ENV_MAX_ORDER) {
            self.search.max_order = parse_value(ENV_MAX_ORDER, &v)?;
        }
        if let Some(v) = lookup(ENV_ABORT_MIN_ORDER) {
            self.search.abort_min_order = parse_value(ENV_ABORT_MIN_ORDER, &v)?;
        }
        if let Some(v) = lookup(ENV_STRATEGY) {
            self.search.strategy = FitStrategy::from_str(v.trim(), true)
                .map_err(|e| AppError::invalid(format!("Invalid {ENV_STRATEGY}='{v}': {e}")))?;
        }
        if let Some(v) = lookup(ENV_CROP_LEADING) {
            self.preprocess.crop_leading = parse_value(ENV_CROP_LEADING, &v)?;
        }
        if let Some(v) = lookup(ENV_WINDOW_FLOOR) {
            self.preprocess.window_floor = parse_value(ENV_WINDOW_FLOOR, &v)?;
        }
        if let Some(v) = lookup(ENV_RESAMPLE) {
            self.preprocess.resample = parse_bool(ENV_RESAMPLE, &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let s = &self.search;
        if !(s.rho_threshold.is_finite() && s.rho_threshold > -1.0 && s.rho_threshold <= 1.0) {
            return Err(AppError::invalid(format!(
                "rho_threshold must lie in (-1, 1], got {}.",
                s.rho_threshold
            )));
        }
        if s.max_order == 0 {
            return Err(AppError::invalid("max_order must be >= 1."));
        }
        let p = &self.preprocess;
        if !(p.window_floor.is_finite() && (0.0..1.0).contains(&p.window_floor)) {
            return Err(AppError::invalid(format!(
                "window_floor must lie in [0, 1), got {}.",
                p.window_floor
            )));
        }
        if !(0.0..=MAX_UNIFORM_TOLERANCE).contains(&p.uniform_tolerance) {
            return Err(AppError::invalid(format!(
                "uniform_tolerance must lie in [0, {MAX_UNIFORM_TOLERANCE}], got {}.",
                p.uniform_tolerance
            )));
        }
        Ok(())
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| AppError::invalid(format!("Invalid {key}='{raw}': {e}")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::invalid(format!("Invalid {key}='{raw}': expected a boolean."))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = FitConfig::default();
        config.validate().unwrap();
        assert_eq!(config.search.rho_threshold, 0.999);
        assert_eq!(config.search.abort_min_order, 3);
        assert!(!config.preprocess.resample);
    }

    #[test]
    fn overrides_replace_defaults() {
        let mut config = FitConfig::default();
        config
            .apply_overrides(lookup_from(&[
                (ENV_RHO_THRESHOLD, "0.95"),
                (ENV_MAX_ORDER, "8"),
                (ENV_STRATEGY, "step-constrained"),
                (ENV_RESAMPLE, "yes"),
            ]))
            .unwrap();
        assert_eq!(config.search.rho_threshold, 0.95);
        assert_eq!(config.search.max_order, 8);
        assert_eq!(config.search.strategy, FitStrategy::StepConstrained);
        assert!(config.preprocess.resample);
        assert_eq!(config.search.abort_min_order, 3);
    }

    #[test]
    fn bad_override_is_reported() {
        let mut config = FitConfig::default();
        let err = config
            .apply_overrides(lookup_from(&[(ENV_MAX_ORDER, "many")]))
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains(ENV_MAX_ORDER));
    }

    #[test]
    fn validate_rejects_zero_order_and_bad_threshold() {
        let mut config = FitConfig::default();
        config.search.max_order = 0;
        assert!(config.validate().is_err());

        let mut config = FitConfig::default();
        config.search.rho_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_caps_uniform_tolerance() {
        let mut config = FitConfig::default();
        config.preprocess.uniform_tolerance = MAX_UNIFORM_TOLERANCE;
        assert!(config.validate().is_ok());

        config.preprocess.uniform_tolerance = 0.5;
        assert_eq!(config.validate().unwrap_err().exit_code(), 2);
    }
}
