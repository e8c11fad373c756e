//! Server error types.

use thiserror::Error;
use xrate_fx::{ConfigError, RateError};

use crate::state::AppState;

/// Errors raised while wiring or driving the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rate service setup failed: {0}")]
    Rate(#[from] RateError),

    #[error("Operation not allowed in state {0:?}")]
    InvalidState(AppState),
}

/// Result type for application operations.
pub type AppResult<T> = Result<T, AppError>;
