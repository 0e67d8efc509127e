//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main that:
//! - parses CLI arguments and installs logging
//! - layers config (defaults, environment, CLI flags)
//! - loads the waveform and runs the pipeline
//! - prints the report and writes optional exports

use std::path::Path;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, FitArgs, SynthArgs};
use crate::data::{SynthSpec, generate_response};
use crate::debug::DebugBundle;
use crate::domain::{FitConfig, PoleZeroRequest};
use crate::error::AppError;
use crate::fit::FitObserver;

pub mod pipeline;

/// Entry point for the `modalfit` binary.
pub fn run() -> Result<(), AppError> {
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_logging(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Synth(args) => handle_synth(args),
    }
}

/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args, FitConfig::from_env()?)?;
    let ingest = crate::io::load_waveform(&args.input)?;
    for e in &ingest.row_errors {
        warn!(line = e.line, "{}", e.message);
    }
    info!(
        rows_read = ingest.rows_read,
        rows_used = ingest.rows_used,
        "loaded waveform"
    );

    let request = PoleZeroRequest::new(args.poles, args.zeros);
    let mut bundle = args.debug_bundle.as_ref().map(|_| DebugBundle::new(input_label(&args.input)));
    let mut no_op = ();
    let observer: &mut dyn FitObserver = match bundle.as_mut() {
        Some(b) => b,
        None => &mut no_op,
    };

    let result =
        pipeline::extract_pole_zeros(&ingest.response, args.kind, &request, &config, observer)?;

    println!(
        "{}",
        crate::report::format_fit_summary(
            &args.input.display().to_string(),
            Some(&ingest),
            &result,
            &config
        )
    );

    if let Some(path) = &args.export_json {
        crate::io::write_result_json(path, &result, &config, Some(&args.input))?;
        info!(path = %path.display(), "wrote result JSON");
    }
    if let (Some(dir), Some(bundle)) = (&args.debug_bundle, &bundle) {
        let path = bundle.write(dir, &config)?;
        info!(path = %path.display(), "wrote debug bundle");
    }

    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let spec = SynthSpec {
        num: args.num,
        den: args.den,
        kind: args.kind,
        t_end: args.t_end,
        samples: args.samples,
        noise_sigma: args.noise,
        seed: args.seed,
    };
    let response = generate_response(&spec)?;
    crate::io::write_waveform_csv(&args.output, &response)?;
    info!(
        path = %args.output.display(),
        samples = response.len(),
        "wrote synthetic waveform"
    );
    Ok(())
}

/// Overlay explicit CLI flags on `base` and validate the result.
pub fn fit_config_from_args(args: &FitArgs, base: FitConfig) -> Result<FitConfig, AppError> {
    let mut config = base;
    if let Some(rho) = args.rho {
        config.search.rho_threshold = rho;
    }
    if let Some(n) = args.max_order {
        config.search.max_order = n;
    }
    if let Some(n) = args.abort_min_order {
        config.search.abort_min_order = n;
    }
    if let Some(strategy) = args.strategy {
        config.search.strategy = strategy;
    }
    if let Some(n) = args.crop {
        config.preprocess.crop_leading = n;
    }
    if args.resample {
        config.preprocess.resample = true;
    }
    config.validate()?;
    Ok(config)
}

fn input_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "run".to_string())
}

/// Rewrite argv so `modalfit FILE ...` means `modalfit fit --input FILE ...`.
///
/// Rules:
/// - `modalfit`                      -> unchanged (clap prints usage)
/// - `modalfit w.csv -p 3`           -> `modalfit fit --input w.csv -p 3`
/// - flags or known subcommands first -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        return argv;
    };

    let is_known = matches!(arg1.as_str(), "fit" | "synth" | "help");
    if is_known || arg1.starts_with('-') {
        return argv;
    }

    argv.splice(1..1, ["fit".to_string(), "--input".to_string()]);
    argv
}
