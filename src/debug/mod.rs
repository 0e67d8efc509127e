//! Debug bundle writer for inspecting every order the search tried.
//!
//! `DebugBundle` is passed to the pipeline as its `FitObserver`; after the run
//! `write` dumps a Markdown file with the trial table and the per-order model.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use num_complex::Complex64;

use crate::domain::{Estimate, FitConfig, TrialRecord};
use crate::error::{AppError, EXIT_INTERNAL};
use crate::fit::FitObserver;

#[derive(Debug, Clone)]
struct TrialSnapshot {
    trial: TrialRecord,
    poles: Vec<Complex64>,
    residues: Vec<Complex64>,
    num: Vec<f64>,
    den: Vec<f64>,
}

/// Records each trial of an order search.
#[derive(Debug, Clone, Default)]
pub struct DebugBundle {
    label: String,
    trials: Vec<TrialSnapshot>,
}

impl DebugBundle {
    /// `label` names the run in the output file (usually the input file stem).
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            trials: Vec::new(),
        }
    }

    pub fn trials(&self) -> impl Iterator<Item = &TrialRecord> {
        self.trials.iter().map(|s| &s.trial)
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Write `modalfit_debug_<label>_<timestamp>.md` under `dir`, creating it
    /// if needed. Returns the file path.
    pub fn write(&self, dir: &Path, config: &FitConfig) -> Result<PathBuf, AppError> {
        create_dir_all(dir)
            .map_err(|e| AppError::new(EXIT_INTERNAL, format!("Failed to create debug dir: {e}")))?;

        let ts = Local::now().format("%Y%m%d_%H%M%S");
        let label = sanitize(&self.label);
        let path = dir.join(format!("modalfit_debug_{label}_{ts}.md"));

        let mut file = File::create(&path)
            .map_err(|e| AppError::new(EXIT_INTERNAL, format!("Failed to create debug file: {e}")))?;
        self.write_to(&mut file, config)
            .map_err(|e| AppError::new(EXIT_INTERNAL, format!("Failed to write debug: {e}")))?;

        Ok(path)
    }

    fn write_to(&self, out: &mut impl Write, config: &FitConfig) -> std::io::Result<()> {
        let search = &config.search;
        let pre = &config.preprocess;

        writeln!(out, "# modalfit debug bundle")?;
        writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
        writeln!(out, "- input: {}", self.label)?;
        writeln!(
            out,
            "- search: strategy={}, rho_threshold={}, max_order={}, abort_min_order={}",
            search.strategy.display_name(),
            search.rho_threshold,
            search.max_order,
            search.abort_min_order
        )?;
        writeln!(
            out,
            "- preprocess: crop_leading={}, drop_nonpositive_time={}, window_floor={}, resample={}",
            pre.crop_leading, pre.drop_nonpositive_time, pre.window_floor, pre.resample
        )?;

        writeln!(out, "\n## Trials")?;
        writeln!(out, "| order | rho | failed |")?;
        writeln!(out, "| - | - | - |")?;
        for s in &self.trials {
            writeln!(
                out,
                "| {} | {} | {} |",
                s.trial.order,
                fmt_opt(s.trial.rho),
                s.trial.failed
            )?;
        }

        for s in &self.trials {
            writeln!(out, "\n## Order {}", s.trial.order)?;
            if s.trial.failed {
                writeln!(out, "Estimator failed; coefficients are zero-filled.")?;
            }
            writeln!(out, "- num: {}", fmt_vec(&s.num))?;
            writeln!(out, "- den: {}", fmt_vec(&s.den))?;
            writeln!(out, "\n| pole (rad/s) | residue |")?;
            writeln!(out, "| - | - |")?;
            for (p, r) in s.poles.iter().zip(&s.residues) {
                writeln!(out, "| {} | {} |", fmt_complex(*p), fmt_complex(*r))?;
            }
        }
        Ok(())
    }
}

impl FitObserver for DebugBundle {
    fn on_trial(&mut self, trial: &TrialRecord, estimate: &Estimate) {
        self.trials.push(TrialSnapshot {
            trial: *trial,
            poles: estimate.poles.clone(),
            residues: estimate.residues.clone(),
            num: estimate.num.clone(),
            den: estimate.den.clone(),
        });
    }
}

fn sanitize(label: &str) -> String {
    let s: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if s.is_empty() { "run".to_string() } else { s }
}

fn fmt_vec(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v:.6e}")).collect();
    format!("[{}]", parts.join(", "))
}

fn fmt_complex(z: Complex64) -> String {
    format!("{:.6e}{:+.6e}j", z.re, z.im)
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.6}"),
        _ => "-".to_string(),
    }
}
