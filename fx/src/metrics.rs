//! Counters for rate service monitoring.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Rate service metrics.
#[derive(Debug, Default)]
pub struct RateMetrics {
    /// Reads served from cache.
    pub cache_hits: AtomicU64,
    /// Reads that found nothing usable in cache.
    pub cache_misses: AtomicU64,
    /// Upstream attempts made.
    pub refresh_attempts: AtomicU64,
    /// Refreshes that stored a new rate.
    pub refresh_successes: AtomicU64,
    /// Refreshes that ran out of attempts.
    pub refresh_failures: AtomicU64,
    /// Scheduled refreshes that failed and were swallowed.
    pub scheduled_failures: AtomicU64,
}

impl RateMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn attempt(&self) {
        self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn refresh_success(&self) {
        self.refresh_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn refresh_failure(&self) {
        self.refresh_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn scheduled_failure(&self) {
        self.scheduled_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            refresh_attempts: self.refresh_attempts.load(Ordering::Relaxed),
            refresh_successes: self.refresh_successes.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
            scheduled_failures: self.scheduled_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RateMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub refresh_attempts: u64,
    pub refresh_successes: u64,
    pub refresh_failures: u64,
    pub scheduled_failures: u64,
}
