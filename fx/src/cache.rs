//! Rate caching with TTL support.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;
use xrate_common::{constants, Rate};

/// Cached rate entry.
#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    rate: Rate,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(rate: Rate, ttl: Duration) -> Self {
        Self {
            rate,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Thread-safe key/value rate cache with one TTL for every entry.
///
/// Entries are always replaced whole, so a reader sees either the previous
/// rate or the new one.
pub struct RateCache {
    cache: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl RateCache {
    /// Create a cache with the default one minute TTL.
    pub fn new() -> Self {
        Self::with_ttl(constants::default_cache_ttl())
    }

    /// Create a cache with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            cache: DashMap::new(),
            ttl,
        }
    }

    /// Get a rate if present and not expired.
    pub fn get(&self, key: &str) -> Option<Rate> {
        if let Some(entry) = self.cache.get(key) {
            if entry.is_valid() {
                debug!(key, "Cache hit");
                return Some(entry.rate);
            }

            debug!(key, "Cache entry expired");
            drop(entry);
            self.cache.remove_if(key, |_, entry| !entry.is_valid());
        }

        debug!(key, "Cache miss");
        None
    }

    /// Store a rate, replacing any previous entry.
    pub fn set(&self, key: &str, rate: Rate) {
        self.cache
            .insert(key.to_string(), CacheEntry::new(rate, self.ttl));
    }

    /// Get the number of entries in cache, expired ones included.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared rate cache.
pub type SharedRateCache = Arc<RateCache>;
