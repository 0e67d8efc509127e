//! Rational transfer-function models.
//!
//! Models are handled as small, pure functions over `(num, den)` coefficient
//! slices so the estimator, synthesis and reporting code can share them.

pub mod transfer;

pub use transfer::*;
