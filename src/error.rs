//! Crate-wide error type.
//!
//! Every fallible operation returns `AppError`. The exit code doubles as a
//! coarse error class so the binary can map it straight to a process status:
//!
//! - `2`: invalid input, usage, I/O, or a caller contract violation
//! - `3`: insufficient data
//! - `4`: numerical or internal failure
//!
//! Numerical instability inside the estimator is *not* reported through this
//! type; see `Estimate::failed`.

use thiserror::Error;

/// Exit code for invalid input and contract violations.
pub const EXIT_INVALID: u8 = 2;
/// Exit code for inputs that leave nothing to work with.
pub const EXIT_NO_DATA: u8 = 3;
/// Exit code for numerical/internal failures.
pub const EXIT_INTERNAL: u8 = 4;

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Shorthand for a caller contract violation (exit code 2).
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(EXIT_INVALID, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
