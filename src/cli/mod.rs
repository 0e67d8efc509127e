//! Command-line parsing for the response fitter.
//!
//! Argument parsing stays separate from the fitting code; `app` turns these
//! structs into a `FitConfig` and runs the pipeline.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{FitStrategy, ResponseKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "modalfit",
    version,
    about = "Identify poles and zeros from a measured step or impulse response"
)]
pub struct Cli {
    /// Log every order trial (same as RUST_LOG=debug).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a waveform CSV and print the pole/zero magnitudes in Hz.
    Fit(FitArgs),
    /// Write a synthetic waveform for a known transfer function.
    Synth(SynthArgs),
}

/// Options for `modalfit fit`.
///
/// Search and preprocessing flags are optional: when absent, the value from
/// the environment (`MODALFIT_*`, `.env`) or the built-in default is used.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Waveform CSV with a time column and an amplitude column.
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Whether the waveform is a step or an impulse response.
    #[arg(short, long, value_enum, default_value_t = ResponseKind::Step)]
    pub kind: ResponseKind,

    /// Number of pole magnitudes to report.
    #[arg(short = 'p', long, default_value_t = 2)]
    pub poles: usize,

    /// Number of zero magnitudes to report.
    #[arg(short = 'z', long, default_value_t = 0)]
    pub zeros: usize,

    /// Correlation the fit must exceed to stop the order search.
    #[arg(long)]
    pub rho: Option<f64>,

    /// Highest model order to try.
    #[arg(long)]
    pub max_order: Option<usize>,

    /// Lowest order at which an estimator failure stops the search.
    #[arg(long)]
    pub abort_min_order: Option<usize>,

    #[arg(long, value_enum)]
    pub strategy: Option<FitStrategy>,

    /// Drop this many samples from the start of the cleaned waveform.
    #[arg(long)]
    pub crop: Option<usize>,

    /// Resample the prepared waveform onto a uniform grid.
    #[arg(long)]
    pub resample: bool,

    /// Export the result and config to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,

    /// Write a Markdown debug bundle with every order trial into this directory.
    #[arg(long = "debug-bundle", value_name = "DIR")]
    pub debug_bundle: Option<PathBuf>,
}

/// Options for `modalfit synth`.
#[derive(Debug, Parser, Clone)]
pub struct SynthArgs {
    /// Numerator coefficients, highest degree first (e.g. `2`).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub num: Vec<f64>,

    /// Denominator coefficients, highest degree first (e.g. `1,3,2`).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub den: Vec<f64>,

    #[arg(short, long, value_enum, default_value_t = ResponseKind::Step)]
    pub kind: ResponseKind,

    /// Last sample time (seconds).
    #[arg(long, default_value_t = 10.0)]
    pub t_end: f64,

    #[arg(long, default_value_t = 200)]
    pub samples: usize,

    /// Standard deviation of additive Gaussian noise.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Random seed for the noise.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV path.
    #[arg(short, long, value_name = "CSV")]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fit_with_overrides() {
        let cli = Cli::try_parse_from([
            "modalfit", "fit", "--input", "w.csv", "--kind", "impulse", "-p", "3", "--rho", "0.99",
            "--strategy", "step-constrained", "--resample", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.kind, ResponseKind::Impulse);
        assert_eq!(args.poles, 3);
        assert_eq!(args.zeros, 0);
        assert_eq!(args.rho, Some(0.99));
        assert_eq!(args.strategy, Some(FitStrategy::StepConstrained));
        assert!(args.resample);
        assert!(args.max_order.is_none());
    }

    #[test]
    fn parses_synth_coefficient_lists() {
        let cli = Cli::try_parse_from([
            "modalfit", "synth", "--num", "-1,2", "--den", "1,3,2", "--output", "out.csv",
        ])
        .unwrap();
        let Command::Synth(args) = cli.command else {
            panic!("expected synth");
        };
        assert_eq!(args.num, vec![-1.0, 2.0]);
        assert_eq!(args.den, vec![1.0, 3.0, 2.0]);
        assert_eq!(args.samples, 200);
    }

    #[test]
    fn fit_requires_input() {
        assert!(Cli::try_parse_from(["modalfit", "fit"]).is_err());
    }
}
