//! Mathematical utilities: least squares, polynomials, exponential bases and
//! correlation.

pub mod basis;
pub mod ols;
pub mod poly;
pub mod stats;

pub use basis::*;
pub use ols::*;
pub use poly::*;
pub use stats::*;
