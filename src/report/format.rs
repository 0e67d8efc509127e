//! Formatted terminal output.
//!
//! Formatting lives here so the fitting code stays free of presentation
//! concerns and output changes stay localized.

use crate::domain::{FitConfig, FitResult, FitStatus, TrialRecord};
use crate::io::ingest::IngestedWaveform;
use crate::report::residual_stats;

/// Format the full run summary: input stats, search settings, trials and
/// the reduced pole/zero lists.
pub fn format_fit_summary(
    label: &str,
    ingest: Option<&IngestedWaveform>,
    result: &FitResult,
    config: &FitConfig,
) -> String {
    let mut out = String::new();

    out.push_str("=== modalfit - step/impulse response identification ===\n");
    out.push_str(&format!("Input: {label}\n"));
    if let Some(ingest) = ingest {
        let r = &ingest.response;
        let (t0, t1) = match (r.times().first(), r.times().last()) {
            (Some(a), Some(b)) => (*a, *b),
            _ => (f64::NAN, f64::NAN),
        };
        out.push_str(&format!(
            "Samples: used={} read={} | t=[{t0:.4e}, {t1:.4e}]\n",
            ingest.rows_used, ingest.rows_read
        ));
        if !ingest.row_errors.is_empty() {
            out.push_str(&format!("Skipped rows: {}\n", ingest.row_errors.len()));
        }
    }
    out.push_str(&format!(
        "Kind: {:?} | strategy: {} | rho threshold: {}\n",
        result.kind,
        result.strategy.display_name(),
        config.search.rho_threshold
    ));

    out.push_str(&format!("\nStatus: {}\n", fmt_status(&result.status)));
    if result.failed {
        out.push_str("Warning: the returned estimate is marked failed; coefficients are zero-filled.\n");
    }

    if !result.trials.is_empty() {
        out.push_str("\nOrder trials:\n");
        out.push_str(&format_trials(&result.trials, result.order));
    }

    if result.status != FitStatus::Degenerate {
        out.push_str("\nModel:\n");
        out.push_str(&format!("- order: {}\n", result.order));
        out.push_str(&format!("- num: {}\n", fmt_vec(&result.num)));
        out.push_str(&format!("- den: {}\n", fmt_vec(&result.den)));
        if let Some(stats) = result.estimate.as_ref().and_then(residual_stats) {
            out.push_str(&format!(
                "- residual: rms={:.4e} max={:.4e} (n={})\n",
                stats.rms, stats.max_abs, stats.n
            ));
        }
    }

    out.push('\n');
    out.push_str(&format_roots("Poles (Hz)", &result.poles_hz));
    out.push_str(&format_roots("Zeros (Hz)", &result.zeros_hz));
    out
}

/// One line per trial; the returned order is starred.
pub fn format_trials(trials: &[TrialRecord], chosen: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("  {:>5} {:>12} {:>6}\n", "order", "rho", "failed"));
    out.push_str(&format!("  {:->5} {:->12} {:->6}\n", "", "", ""));
    for t in trials {
        let mark = if t.order == chosen { "*" } else { " " };
        out.push_str(&format!(
            "{mark} {:>5} {:>12} {:>6}\n",
            t.order,
            fmt_rho(t.rho),
            if t.failed { "yes" } else { "" }
        ));
    }
    out
}

/// Padding entries print as `-`.
pub fn format_roots(title: &str, values: &[f64]) -> String {
    if values.is_empty() {
        return format!("{title}: (none requested)\n");
    }
    let parts: Vec<String> = values
        .iter()
        .map(|v| if v.is_finite() { format!("{v:.6e}") } else { "-".to_string() })
        .collect();
    format!("{title}: {}\n", parts.join("  "))
}

fn fmt_status(status: &FitStatus) -> String {
    match status {
        FitStatus::Succeeded { order, rho } => format!("succeeded at order {order} (rho={rho:.6})"),
        FitStatus::Exhausted { max_order } => {
            format!("threshold not met up to order {max_order}; returning the last order")
        }
        FitStatus::Aborted { order } => format!("estimator failed at order {order}; search aborted"),
        FitStatus::Degenerate => "no observable dynamics; nothing fitted".to_string(),
    }
}

fn fmt_rho(rho: Option<f64>) -> String {
    match rho {
        Some(v) if v.is_finite() => format!("{v:.8}"),
        _ => "-".to_string(),
    }
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6e}")).collect();
    format!("[{}]", parts.join(", "))
}
