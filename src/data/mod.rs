//! Synthetic waveform generation.

pub mod sample;

pub use sample::*;
