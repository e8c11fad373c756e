//! Error types for rate values.

use thiserror::Error;

/// Reasons a raw number cannot be used as an exchange rate.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum InvalidRate {
    /// NaN or an infinity.
    #[error("Rate is not a finite number: {0}")]
    NotFinite(f64),

    /// Zero or negative.
    #[error("Rate must be greater than zero, got {0}")]
    NotPositive(f64),
}
