//! `modal-fit` library crate.
//!
//! Identifies a continuous-time transfer function from a sampled step or
//! impulse response (least-squares complex exponential fitting) and reports
//! its pole and zero magnitudes in Hz.
//!
//! The binary (`modalfit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the pipeline can be embedded (batch jobs, notebooks, other front-ends)

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod preprocess;
pub mod pz;
pub mod report;
