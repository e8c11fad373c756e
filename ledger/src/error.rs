//! Ledger error types.

use rust_decimal::Decimal;
use thiserror::Error;
use xrate_fx::RateError;

/// Errors that can occur while recording conversions.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Source amount is zero or negative.
    #[error("Amount must be greater than zero, got {0}")]
    InvalidAmount(Decimal),

    /// The rate could not be obtained or applied.
    #[error(transparent)]
    Rate(#[from] RateError),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
