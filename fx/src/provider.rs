//! Upstream rate provider trait and implementations.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};
use xrate_common::Rate;

use crate::config::RateServiceConfig;
use crate::error::{RateError, RateResult};

/// Field of the upstream body that carries the rate.
pub const RATE_FIELD: &str = "exchange_rate";

/// Header carrying the upstream API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Source of raw rate quotes.
///
/// Implementations only deal with transport: they hand back whatever JSON
/// body the upstream produced and leave rate validation to
/// [`validate_quote`].
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Perform one upstream request and return the decoded body.
    async fn fetch_quote(&self) -> RateResult<Value>;
}

/// Check an upstream body and extract the rate from it.
pub fn validate_quote(body: &Value) -> RateResult<Rate> {
    let field = body
        .as_object()
        .ok_or_else(|| RateError::Validation(format!("expected a JSON object, got {body}")))?
        .get(RATE_FIELD)
        .ok_or_else(|| RateError::Validation(format!("missing `{RATE_FIELD}` in {body}")))?;

    let value = field.as_f64().ok_or_else(|| {
        RateError::Validation(format!("`{RATE_FIELD}` is not a number: {field}"))
    })?;

    Ok(Rate::new(value)?)
}

/// Provider backed by an HTTP JSON endpoint.
pub struct HttpRateProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpRateProvider {
    /// Build a client with the configured timeout and API key header.
    pub fn new(config: &RateServiceConfig) -> RateResult<Self> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| RateError::Transport(format!("invalid API key header: {e}")))?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        // Zero means no timeout.
        if !config.request_timeout.is_zero() {
            builder = builder.timeout(config.request_timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            url: root_url(&config.api_url),
        })
    }
}

/// The upstream root resource: the base URL with exactly one trailing slash.
fn root_url(base: &str) -> String {
    format!("{}/", base.trim_end_matches('/'))
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn fetch_quote(&self) -> RateResult<Value> {
        let response = self.client.get(&self.url).send().await?.error_for_status()?;
        let status = response.status();
        let body = response.bytes().await?;

        debug!(status = %status, bytes = body.len(), "Received upstream response");

        serde_json::from_slice(&body).map_err(|e| {
            warn!(error = %e, "Upstream body is not valid JSON");
            RateError::Validation(format!("response body is not JSON: {e}"))
        })
    }
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    replies: parking_lot::Mutex<std::collections::VecDeque<RateResult<Value>>>,
    last: parking_lot::Mutex<Option<RateResult<Value>>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a provider that replays `replies` in order, repeating the last one.
    pub fn new(replies: Vec<RateResult<Value>>) -> Self {
        Self {
            name: "mock".to_string(),
            replies: parking_lot::Mutex::new(replies.into()),
            last: parking_lot::Mutex::new(None),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Provider that always returns the given rate.
    pub fn with_rate(rate: f64) -> Self {
        Self::new(vec![Ok(serde_json::json!({ "exchange_rate": rate }))])
    }

    /// Provider that always fails at the transport level.
    pub fn failing(message: &str) -> Self {
        Self::new(vec![Err(RateError::Transport(message.to_string()))])
    }

    /// Number of upstream requests made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_quote(&self) -> RateResult<Value> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let mut last = self.last.lock();
        if let Some(reply) = self.replies.lock().pop_front() {
            *last = Some(reply);
        }

        last.clone()
            .unwrap_or_else(|| Err(RateError::Transport("no scripted reply".to_string())))
    }
}
