//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the sampled waveform (`SampledResponse`) and its kind (`ResponseKind`)
//! - run configuration (`FitConfig`, `PreprocessConfig`, `SearchConfig`)
//! - per-trial and final fit outputs (`Estimate`, `FitStatus`, `FitResult`)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
