//! Response preprocessing.
//!
//! Turns a captured waveform into the uniformly sampled sequence the
//! estimator expects:
//!
//! - `clean`: duplicate timestamps, non-positive times, start-up artifacts
//! - `prepare_for_fit`: differentiation, windowing, optional resampling
//! - `monotone`: monotone shaping and inversion of sampled transfer curves

pub mod clean;
pub mod monotone;

pub use clean::*;
pub use monotone::*;
