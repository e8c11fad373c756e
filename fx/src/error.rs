//! Rate service error types.

use thiserror::Error;
use xrate_common::InvalidRate;

/// Errors that can occur while fetching, caching or serving the rate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateError {
    /// Upstream answered, but the body did not carry a usable rate.
    #[error("Invalid exchange rate response: {0}")]
    Validation(String),

    /// Network error, timeout or non-2xx status from upstream.
    #[error("Exchange rate request failed: {0}")]
    Transport(String),

    /// Every allowed attempt failed.
    #[error("Failed to refresh exchange rate after {attempts} attempts")]
    RefreshExhausted {
        attempts: u32,
        #[source]
        last_error: Option<Box<RateError>>,
    },

    /// The cache stayed empty even after a refresh reported success.
    #[error("Exchange rate unavailable from cache even after on-demand refresh")]
    RateUnavailable,
}

impl RateError {
    /// Check if another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RateError::Validation(_) | RateError::Transport(_))
    }

    /// Get error code for diagnostics.
    pub fn error_code(&self) -> &'static str {
        match self {
            RateError::Validation(_) => "VALIDATION_FAILURE",
            RateError::Transport(_) => "TRANSPORT_FAILURE",
            RateError::RefreshExhausted { .. } => "REFRESH_EXHAUSTED",
            RateError::RateUnavailable => "RATE_UNAVAILABLE",
        }
    }

    /// Message safe to show outside the process.
    pub fn public_message(&self) -> &'static str {
        "Service unavailable"
    }

    /// The failure behind an exhausted refresh, if any attempt was made.
    pub fn last_error(&self) -> Option<&RateError> {
        match self {
            RateError::RefreshExhausted { last_error, .. } => last_error.as_deref(),
            _ => None,
        }
    }
}

impl From<InvalidRate> for RateError {
    fn from(err: InvalidRate) -> Self {
        RateError::Validation(err.to_string())
    }
}

impl From<reqwest::Error> for RateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RateError::Transport(format!("request timed out: {err}"))
        } else if let Some(status) = err.status() {
            RateError::Transport(format!("upstream returned {status}"))
        } else {
            RateError::Transport(err.to_string())
        }
    }
}

/// Result type for rate operations.
pub type RateResult<T> = Result<T, RateError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_exhausted_message_and_source() {
        let err = RateError::RefreshExhausted {
            attempts: 2,
            last_error: Some(Box::new(RateError::Transport("network fail".into()))),
        };

        assert_eq!(
            err.to_string(),
            "Failed to refresh exchange rate after 2 attempts"
        );
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("Exchange rate request failed: network fail".to_string())
        );
        assert_eq!(
            err.last_error(),
            Some(&RateError::Transport("network fail".into()))
        );
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(RateError::Validation("x".into()).is_retryable());
        assert!(RateError::Transport("x".into()).is_retryable());
        assert!(!RateError::RateUnavailable.is_retryable());
        assert!(!RateError::RefreshExhausted {
            attempts: 1,
            last_error: None
        }
        .is_retryable());
    }

    #[test]
    fn test_public_message_hides_detail() {
        let err = RateError::Transport("upstream returned 401 Unauthorized".into());
        assert_eq!(err.public_message(), "Service unavailable");
        assert_eq!(err.error_code(), "TRANSPORT_FAILURE");
    }

    #[test]
    fn test_invalid_rate_becomes_validation() {
        let err: RateError = InvalidRate::NotPositive(0.0).into();
        assert!(matches!(err, RateError::Validation(_)));
    }
}
