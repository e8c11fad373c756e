//! Rate service configuration.

use std::time::Duration;

use thiserror::Error;
use xrate_common::constants;

/// Configuration loading errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    /// Values parse but do not make sense together.
    #[error("Invalid configuration: {0}")]
    Rejected(String),
}

/// Configuration for the rate cache service.
///
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RateServiceConfig {
    /// Upstream base URL.
    pub api_url: String,
    /// Value sent in the `x-api-key` header.
    pub api_key: String,
    /// Per-attempt request timeout.
    pub request_timeout: Duration,
    /// Attempts per refresh.
    pub max_retries: u32,
    /// Pause between failed attempts.
    pub retry_delay: Duration,
    /// Key the rate is cached under.
    pub cache_key: String,
    /// Lifetime of a cached rate.
    pub cache_ttl: Duration,
    /// Scheduled refresh period.
    pub refresh_interval: Duration,
}

impl RateServiceConfig {
    /// Create a configuration with default tuning for the given upstream.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            request_timeout: constants::request_timeout(),
            max_retries: constants::DEFAULT_MAX_RETRIES,
            retry_delay: constants::retry_delay(),
            cache_key: constants::DEFAULT_CACHE_KEY.to_string(),
            cache_ttl: constants::default_cache_ttl(),
            refresh_interval: constants::refresh_interval(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("EXCHANGE_API_URL").ok_or(ConfigError::Missing("EXCHANGE_API_URL"))?;
        let api_key = lookup("EXCHANGE_API_KEY").ok_or(ConfigError::Missing("EXCHANGE_API_KEY"))?;

        let mut config = Self::new(api_url, api_key);

        if let Some(ms) = parse_u64(&lookup, "EXCHANGE_API_TIMEOUT")? {
            config.request_timeout = Duration::from_millis(ms);
        }

        if let Some(retries) = parse_u64(&lookup, "EXCHANGE_API_MAX_RETRIES")? {
            config.max_retries = u32::try_from(retries).map_err(|_| ConfigError::Invalid {
                var: "EXCHANGE_API_MAX_RETRIES",
                value: retries.to_string(),
            })?;
        }

        if let Some(ms) = parse_u64(&lookup, "EXCHANGE_API_RETRY_DELAY_MS")? {
            config.retry_delay = Duration::from_millis(ms);
        }

        if let Some(key) = lookup("EXCHANGE_RATE_CACHE_KEY") {
            config.cache_key = key;
        }

        if let Some(ms) = parse_u64(&lookup, "EXCHANGE_RATE_CACHE_TTL_MS")? {
            config.cache_ttl = Duration::from_millis(ms);
        }

        if let Some(ms) = parse_u64(&lookup, "EXCHANGE_RATE_REFRESH_INTERVAL_MS")? {
            config.refresh_interval = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_url.is_empty() {
            return Err(ConfigError::Rejected("API URL cannot be empty".to_string()));
        }

        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::Rejected(format!(
                "API URL must use http or https: {}",
                self.api_url
            )));
        }

        if self.api_key.is_empty() {
            return Err(ConfigError::Rejected("API key cannot be empty".to_string()));
        }

        if self.cache_key.is_empty() {
            return Err(ConfigError::Rejected("Cache key cannot be empty".to_string()));
        }

        if self.cache_ttl.is_zero() {
            return Err(ConfigError::Rejected("Cache TTL cannot be zero".to_string()));
        }

        if self.refresh_interval.is_zero() {
            return Err(ConfigError::Rejected(
                "Refresh interval cannot be zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_u64<F>(lookup: &F, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}
