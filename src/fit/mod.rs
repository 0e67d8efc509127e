//! System identification.
//!
//! Responsibilities:
//!
//! - estimate poles/residues at a fixed model order (`estimator`)
//! - score an estimate against the measured response (`evaluate`)
//! - search model orders until the score is good enough (`search`)

pub mod estimator;
pub mod evaluate;
pub mod search;

pub use estimator::*;
pub use evaluate::*;
pub use search::*;
