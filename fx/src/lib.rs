//! xrate FX Rate Service
//!
//! Keeps a single foreign exchange rate fresh: fetches it from an upstream
//! HTTP API, validates it, caches it with a TTL, refreshes it on a fixed
//! schedule and serves cached or on-demand values with typed errors.
//!
//! # Features
//!
//! - Bounded retry loop with an injectable pause between attempts
//! - Thread-safe TTL cache keyed by a configured name
//! - Cache-first reads with synchronous refresh on a miss
//! - Background refresh at the top of every minute, with clean shutdown
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use xrate_fx::{RateService, RateServiceConfig, RefreshScheduler, RefreshSchedule};
//!
//! let config = RateServiceConfig::from_env()?;
//! let service = Arc::new(RateService::from_config(config)?);
//!
//! let scheduler = RefreshScheduler::spawn(service.clone(), RefreshSchedule::every_minute());
//! let rate = service.get_rate().await?;
//!
//! scheduler.shutdown().await;
//! ```

pub mod config;
pub mod error;
pub mod provider;
pub mod cache;
pub mod delay;
pub mod metrics;
pub mod service;
pub mod scheduler;
pub mod conversion;

pub use config::{ConfigError, RateServiceConfig};
pub use error::{RateError, RateResult};
pub use provider::{validate_quote, HttpRateProvider, RateProvider};
pub use cache::{RateCache, SharedRateCache};
pub use delay::{Delay, TokioDelay};
pub use metrics::{MetricsSnapshot, RateMetrics};
pub use service::{RateService, RateSource};
pub use scheduler::{RefreshHandle, RefreshSchedule, RefreshScheduler};
pub use conversion::convert;

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
#[cfg(any(test, feature = "test-utils"))]
pub use delay::RecordingDelay;
