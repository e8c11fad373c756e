//! Timing defaults and wall-clock helpers for xrate.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Default timing and naming constants.
pub mod constants {
    use super::Duration;

    /// Cache key the rate is stored under.
    pub const DEFAULT_CACHE_KEY: &str = "exchangeRate";

    /// Upstream request attempts per refresh.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Cached rate lifetime (1 minute).
    pub fn default_cache_ttl() -> Duration {
        Duration::from_secs(60)
    }

    /// Scheduled refresh period (1 minute).
    pub fn refresh_interval() -> Duration {
        Duration::from_secs(60)
    }

    /// Upstream request timeout (1 second).
    pub fn request_timeout() -> Duration {
        Duration::from_millis(1000)
    }

    /// Pause between failed attempts (1 second).
    pub fn retry_delay() -> Duration {
        Duration::from_millis(1000)
    }
}

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Time left until the next multiple of `period` counted from the Unix epoch.
///
/// With a one minute period this is the distance to the top of the next
/// minute. A timestamp sitting exactly on a boundary waits a full period.
pub fn until_next_boundary(now: Timestamp, period: Duration) -> Duration {
    let period_ms = period.as_millis() as i64;
    if period_ms == 0 {
        return Duration::ZERO;
    }

    let into_period = now.timestamp_millis().rem_euclid(period_ms);
    Duration::from_millis((period_ms - into_period) as u64)
}
