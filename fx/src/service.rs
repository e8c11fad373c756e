//! The rate cache service: retrying refresh and cache-first reads.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};
use xrate_common::Rate;

use crate::cache::{RateCache, SharedRateCache};
use crate::config::RateServiceConfig;
use crate::delay::{Delay, TokioDelay};
use crate::error::{RateError, RateResult};
use crate::metrics::{MetricsSnapshot, RateMetrics};
use crate::provider::{validate_quote, HttpRateProvider, RateProvider};

/// Anything that can hand out the current rate.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the current rate.
    async fn current_rate(&self) -> RateResult<Rate>;
}

/// Fetches, validates and caches a single exchange rate.
///
/// The cache is the only mutable state and it is owned here; every write is
/// a whole, already validated [`Rate`].
pub struct RateService {
    provider: Arc<dyn RateProvider>,
    cache: SharedRateCache,
    delay: Arc<dyn Delay>,
    metrics: RateMetrics,
    config: RateServiceConfig,
}

impl RateService {
    /// Create a service that sleeps on the tokio timer between attempts.
    pub fn new(
        provider: Arc<dyn RateProvider>,
        cache: SharedRateCache,
        config: RateServiceConfig,
    ) -> Self {
        Self::with_delay(provider, cache, Arc::new(TokioDelay), config)
    }

    /// Create a service with a custom pause between attempts.
    pub fn with_delay(
        provider: Arc<dyn RateProvider>,
        cache: SharedRateCache,
        delay: Arc<dyn Delay>,
        config: RateServiceConfig,
    ) -> Self {
        if config.max_retries == 0 {
            warn!("max_retries is 0, every refresh will fail without contacting upstream");
        }

        Self {
            provider,
            cache,
            delay,
            metrics: RateMetrics::new(),
            config,
        }
    }

    /// Create a service talking HTTP to the configured upstream.
    pub fn from_config(config: RateServiceConfig) -> RateResult<Self> {
        let provider = Arc::new(HttpRateProvider::new(&config)?);
        let cache = Arc::new(RateCache::with_ttl(config.cache_ttl));
        Ok(Self::new(provider, cache, config))
    }

    /// Get the cache backing this service.
    pub fn cache(&self) -> &SharedRateCache {
        &self.cache
    }

    /// Get current metrics.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Fetch a fresh rate and store it, retrying up to `max_retries` times.
    ///
    /// Returns as soon as one attempt succeeds. Only retryable failures lead
    /// to another attempt. On exhaustion the cache is
    /// left as it was and [`RateError::RefreshExhausted`] carries the last
    /// failure.
    #[instrument(skip(self), fields(provider = self.provider.name(), key = %self.config.cache_key))]
    pub async fn refresh_rate(&self) -> RateResult<Rate> {
        let max_retries = self.config.max_retries;
        let mut attempts = 0;
        let mut last_error = None;

        for attempt in 1..=max_retries {
            attempts = attempt;
            self.metrics.attempt();

            match self.attempt().await {
                Ok(rate) => {
                    self.cache.set(&self.config.cache_key, rate);
                    self.metrics.refresh_success();
                    info!(attempt, rate = %rate, "Exchange rate updated");
                    return Ok(rate);
                }
                Err(e) => {
                    error!(
                        attempt,
                        max_retries,
                        code = e.error_code(),
                        error = %e,
                        "Failed to fetch exchange rate"
                    );
                    let retryable = e.is_retryable();
                    last_error = Some(e);

                    if !retryable {
                        warn!(attempt, "Error is not retryable, giving up");
                        break;
                    }

                    if attempt < max_retries {
                        debug!(
                            delay_ms = self.config.retry_delay.as_millis() as u64,
                            next_attempt = attempt + 1,
                            "Waiting before retrying"
                        );
                        self.delay.wait(self.config.retry_delay).await;
                    }
                }
            }
        }

        self.metrics.refresh_failure();
        error!(
            attempts,
            max_retries,
            "All attempts failed, unable to refresh exchange rate"
        );

        Err(RateError::RefreshExhausted {
            attempts,
            last_error: last_error.map(Box::new),
        })
    }

    /// Get the rate, refreshing on demand when the cache has nothing.
    ///
    /// A failed refresh is returned to the caller unchanged.
    #[instrument(skip(self), fields(key = %self.config.cache_key))]
    pub async fn get_rate(&self) -> RateResult<Rate> {
        if let Some(rate) = self.cache.get(&self.config.cache_key) {
            self.metrics.cache_hit();
            debug!(rate = %rate, "Exchange rate found in cache");
            return Ok(rate);
        }

        self.metrics.cache_miss();
        warn!("Exchange rate not found in cache, attempting an on-demand refresh");

        if let Err(e) = self.refresh_rate().await {
            error!(error = %e, "Failed to get exchange rate");
            return Err(e);
        }

        match self.cache.get(&self.config.cache_key) {
            Some(rate) => {
                debug!(rate = %rate, "Exchange rate found in cache after refresh");
                Ok(rate)
            }
            None => {
                error!("Cache miss after on-demand refresh");
                Err(RateError::RateUnavailable)
            }
        }
    }

    /// Entry point for the periodic trigger. Failures are logged, never returned.
    pub async fn handle_scheduled_refresh(&self) {
        info!("Scheduled task: refreshing exchange rate");

        if let Err(e) = self.refresh_rate().await {
            self.metrics.scheduled_failure();
            error!(
                error = %e,
                last_error = ?e.last_error().map(|le| le.to_string()),
                "Scheduled exchange rate refresh failed, keeping cached value"
            );
        }
    }

    async fn attempt(&self) -> RateResult<Rate> {
        let body = self.fetch().await?;

        validate_quote(&body).map_err(|e| {
            warn!(body = %body, error = %e, "Invalid exchange rate API response received");
            e
        })
    }

    async fn fetch(&self) -> RateResult<Value> {
        let timeout = self.config.request_timeout;
        let request = self.provider.fetch_quote();

        if timeout.is_zero() {
            return request.await;
        }

        match tokio::time::timeout(timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(RateError::Transport(format!(
                "request timed out after {}ms",
                timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl RateSource for RateService {
    async fn current_rate(&self) -> RateResult<Rate> {
        self.get_rate().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::RecordingDelay;
    use crate::provider::MockRateProvider;
    use serde_json::json;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    const RETRY_DELAY: Duration = Duration::from_millis(250);

    fn test_config(max_retries: u32) -> RateServiceConfig {
        let mut config = RateServiceConfig::new("https://api.test/", "apikey");
        config.request_timeout = Duration::from_millis(500);
        config.max_retries = max_retries;
        config.retry_delay = RETRY_DELAY;
        config
    }

    fn setup(
        provider: Arc<MockRateProvider>,
        max_retries: u32,
    ) -> (RateService, Arc<RecordingDelay>) {
        let delay = Arc::new(RecordingDelay::new());
        let service = RateService::with_delay(
            provider,
            Arc::new(RateCache::new()),
            delay.clone(),
            test_config(max_retries),
        );
        (service, delay)
    }

    fn rate(value: f64) -> Rate {
        Rate::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_refresh_caches_valid_rate() {
        let provider = Arc::new(MockRateProvider::with_rate(4.5));
        let (service, delay) = setup(provider.clone(), 3);

        let refreshed = assert_ok!(service.refresh_rate().await);

        assert_eq!(refreshed, rate(4.5));
        assert_eq!(service.cache().get("exchangeRate"), Some(rate(4.5)));
        assert_eq!(provider.calls(), 1);
        assert!(delay.waits().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_exhausts_after_max_retries() {
        let provider = Arc::new(MockRateProvider::failing("network fail"));
        let (service, delay) = setup(provider.clone(), 3);

        let err = assert_err!(service.refresh_rate().await);

        assert_eq!(
            err,
            RateError::RefreshExhausted {
                attempts: 3,
                last_error: Some(Box::new(RateError::Transport("network fail".into()))),
            }
        );
        assert_eq!(provider.calls(), 3);
        assert_eq!(delay.waits(), vec![RETRY_DELAY, RETRY_DELAY]);
        assert!(service.cache().get("exchangeRate").is_none());
        assert_eq!(service.metrics().refresh_failures, 1);
    }

    #[tokio::test]
    async fn test_refresh_stops_after_first_success() {
        let provider = Arc::new(MockRateProvider::new(vec![
            Err(RateError::Transport("down".into())),
            Ok(json!({ "exchange_rate": "4.5" })),
            Ok(json!({ "exchange_rate": 4.5 })),
            Ok(json!({ "exchange_rate": 9.9 })),
        ]));
        let (service, delay) = setup(provider.clone(), 5);

        let refreshed = assert_ok!(service.refresh_rate().await);

        assert_eq!(refreshed, rate(4.5));
        assert_eq!(provider.calls(), 3);
        assert_eq!(delay.waits().len(), 2);

        let metrics = service.metrics();
        assert_eq!(metrics.refresh_attempts, 3);
        assert_eq!(metrics.refresh_successes, 1);
    }

    #[tokio::test]
    async fn test_invalid_bodies_are_retried() {
        let bad_bodies = [
            json!({}),
            json!({ "exchange_rate": "4.5" }),
            json!({ "exchange_rate": 0 }),
            json!({ "exchange_rate": -1 }),
        ];

        for bad in bad_bodies {
            let provider = Arc::new(MockRateProvider::new(vec![
                Ok(bad.clone()),
                Ok(json!({ "exchange_rate": 4.5 })),
            ]));
            let (service, delay) = setup(provider.clone(), 2);

            let refreshed = service.refresh_rate().await;

            assert_eq!(refreshed, Ok(rate(4.5)), "body {bad} should be retried");
            assert_eq!(provider.calls(), 2);
            assert_eq!(delay.waits(), vec![RETRY_DELAY]);
        }
    }

    #[tokio::test]
    async fn test_invalid_body_never_reaches_cache() {
        let provider = Arc::new(MockRateProvider::new(vec![Ok(json!({ "exchange_rate": 0 }))]));
        let (service, _delay) = setup(provider, 2);

        let err = assert_err!(service.refresh_rate().await);

        assert!(matches!(err.last_error(), Some(RateError::Validation(_))));
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn test_single_attempt_has_no_delay() {
        let provider = Arc::new(MockRateProvider::failing("down"));
        let (service, delay) = setup(provider.clone(), 1);

        let err = assert_err!(service.refresh_rate().await);

        assert!(matches!(err, RateError::RefreshExhausted { attempts: 1, .. }));
        assert_eq!(provider.calls(), 1);
        assert!(delay.waits().is_empty());
    }

    #[tokio::test]
    async fn test_zero_retries_makes_no_attempt() {
        let provider = Arc::new(MockRateProvider::with_rate(4.5));
        let (service, _delay) = setup(provider.clone(), 0);

        let err = assert_err!(service.refresh_rate().await);

        assert_eq!(
            err,
            RateError::RefreshExhausted {
                attempts: 0,
                last_error: None
            }
        );
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_rate() {
        let provider = Arc::new(MockRateProvider::failing("down"));
        let (service, _delay) = setup(provider, 2);
        service.cache().set("exchangeRate", rate(4.2));

        assert_err!(service.refresh_rate().await);

        assert_eq!(service.cache().get("exchangeRate"), Some(rate(4.2)));
    }

    #[tokio::test]
    async fn test_get_rate_cache_hit_skips_upstream() {
        let provider = Arc::new(MockRateProvider::with_rate(9.9));
        let (service, _delay) = setup(provider.clone(), 3);
        service.cache().set("exchangeRate", rate(4.5));

        let current = assert_ok!(service.get_rate().await);

        assert_eq!(current.value(), 4.5);
        assert_eq!(provider.calls(), 0);
        assert_eq!(service.metrics().cache_hits, 1);
    }

    #[tokio::test]
    async fn test_get_rate_refreshes_on_miss() {
        let provider = Arc::new(MockRateProvider::with_rate(5.1));
        let (service, _delay) = setup(provider.clone(), 3);

        let current = assert_ok!(service.get_rate().await);

        assert_eq!(current, rate(5.1));
        assert_eq!(service.cache().get("exchangeRate"), Some(rate(5.1)));
        assert_eq!(provider.calls(), 1);

        // Second read is served from cache.
        assert_ok!(service.get_rate().await);
        assert_eq!(provider.calls(), 1);

        let metrics = service.metrics();
        assert_eq!(metrics.cache_misses, 1);
        assert_eq!(metrics.cache_hits, 1);
    }

    #[tokio::test]
    async fn test_get_rate_propagates_refresh_error() {
        let provider = Arc::new(MockRateProvider::failing("network fail"));
        let (service, _delay) = setup(provider.clone(), 2);

        let err = assert_err!(service.get_rate().await);

        assert_eq!(
            err,
            RateError::RefreshExhausted {
                attempts: 2,
                last_error: Some(Box::new(RateError::Transport("network fail".into()))),
            }
        );
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_rate_refreshes_expired_entry() {
        let provider = Arc::new(MockRateProvider::with_rate(5.0));
        let (service, _delay) = setup(provider.clone(), 3);
        service.cache().set("exchangeRate", rate(4.0));

        assert_eq!(assert_ok!(service.get_rate().await), rate(4.0));
        assert_eq!(provider.calls(), 0);

        tokio::time::advance(Duration::from_secs(61)).await;

        assert_eq!(assert_ok!(service.get_rate().await), rate(5.0));
        assert_eq!(provider.calls(), 1);
        assert_eq!(service.cache().get("exchangeRate"), Some(rate(5.0)));
        assert_eq!(service.metrics().cache_misses, 1);
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_refresh() {
        let provider = Arc::new(MockRateProvider::new(vec![Err(RateError::RateUnavailable)]));
        let (service, delay) = setup(provider.clone(), 3);

        let err = assert_err!(service.refresh_rate().await);

        assert_eq!(
            err,
            RateError::RefreshExhausted {
                attempts: 1,
                last_error: Some(Box::new(RateError::RateUnavailable)),
            }
        );
        assert_eq!(provider.calls(), 1);
        assert!(delay.waits().is_empty());
    }

    #[tokio::test]
    async fn test_get_rate_unavailable_when_entry_vanishes() {
        let provider = Arc::new(MockRateProvider::with_rate(4.5));
        let delay = Arc::new(RecordingDelay::new());
        // Entries expire as soon as they are written.
        let cache = Arc::new(RateCache::with_ttl(Duration::from_nanos(1)));
        let service = RateService::with_delay(provider.clone(), cache, delay, test_config(3));

        let err = assert_err!(service.get_rate().await);

        assert_eq!(err, RateError::RateUnavailable);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_network_errors_end_to_end() {
        let provider = Arc::new(MockRateProvider::failing("network fail"));
        let mut config = test_config(2);
        config.retry_delay = Duration::ZERO;
        let service = RateService::new(provider.clone(), Arc::new(RateCache::new()), config);

        let err = assert_err!(service.refresh_rate().await);

        assert!(err.to_string().contains("after 2 attempts"));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_scheduled_refresh_swallows_failure() {
        let provider = Arc::new(MockRateProvider::failing("down"));
        let (service, _delay) = setup(provider.clone(), 2);
        service.cache().set("exchangeRate", rate(4.2));

        service.handle_scheduled_refresh().await;

        assert_eq!(provider.calls(), 2);
        assert_eq!(service.metrics().scheduled_failures, 1);
        assert_eq!(service.cache().get("exchangeRate"), Some(rate(4.2)));
    }

    #[tokio::test]
    async fn test_scheduled_refresh_updates_cache() {
        let provider = Arc::new(MockRateProvider::with_rate(4.7));
        let (service, _delay) = setup(provider, 2);
        service.cache().set("exchangeRate", rate(4.2));

        service.handle_scheduled_refresh().await;

        assert_eq!(service.cache().get("exchangeRate"), Some(rate(4.7)));
        assert_eq!(service.metrics().scheduled_failures, 0);
    }

    struct HangingProvider;

    #[async_trait]
    impl RateProvider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn fetch_quote(&self) -> RateResult<Value> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_upstream_times_out() {
        let service = RateService::new(
            Arc::new(HangingProvider),
            Arc::new(RateCache::new()),
            test_config(2),
        );
        let start = tokio::time::Instant::now();

        let err = assert_err!(service.refresh_rate().await);

        assert!(matches!(
            err.last_error(),
            Some(RateError::Transport(msg)) if msg.contains("timed out")
        ));
        // Two timeouts plus one pause between them.
        assert_eq!(start.elapsed(), Duration::from_millis(500 + 250 + 500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_delay_between_attempts() {
        let provider = Arc::new(MockRateProvider::failing("down"));
        let service = RateService::new(provider, Arc::new(RateCache::new()), test_config(4));
        let start = tokio::time::Instant::now();

        assert_err!(service.refresh_rate().await);

        assert_eq!(start.elapsed(), RETRY_DELAY * 3);
    }

    #[tokio::test]
    async fn test_concurrent_reads_see_valid_rate() {
        let provider = Arc::new(MockRateProvider::with_rate(4.5));
        let (service, _delay) = setup(provider.clone(), 3);
        let service = Arc::new(service);

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.get_rate().await })
            })
            .collect();

        for task in tasks {
            let current = task.await.unwrap().unwrap();
            assert_eq!(current, rate(4.5));
        }

        // Concurrent misses may each refresh; never more than one call per reader.
        assert!(provider.calls() >= 1 && provider.calls() <= 16);
    }

    #[tokio::test]
    async fn test_rate_source_delegates_to_get_rate() {
        let provider = Arc::new(MockRateProvider::with_rate(4.5));
        let (service, _delay) = setup(provider, 1);
        let source: &dyn RateSource = &service;

        assert_eq!(source.current_rate().await, Ok(rate(4.5)));
    }
}
