//! Input/output helpers.
//!
//! - CSV waveform ingest + validation (`ingest`)
//! - waveform CSV and result JSON exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
