//! Application wiring and request handlers.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};
use xrate_common::Rate;
use xrate_fx::{RateError, RateResult, RateService, RefreshHandle, RefreshScheduler};
use xrate_ledger::{InMemoryTransactionStore, LedgerError, TransactionService};

use crate::config::ServerConfig;
use crate::dto::{ErrorResponse, ExchangeRateResponse, TransactionResponse};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// The running process: rate service, ledger and background refresh.
pub struct App {
    config: ServerConfig,
    rates: Arc<RateService>,
    transactions: TransactionService,
    state: RwLock<AppState>,
    scheduler: Mutex<Option<RefreshHandle>>,
}

impl App {
    /// Wire an application around an existing rate service.
    pub fn new(config: ServerConfig, rates: Arc<RateService>) -> Self {
        let transactions =
            TransactionService::new(rates.clone(), Arc::new(InMemoryTransactionStore::new()));

        Self {
            config,
            rates,
            transactions,
            state: RwLock::new(AppState::Starting),
            scheduler: Mutex::new(None),
        }
    }

    /// Validate configuration and build the HTTP-backed rate service.
    pub fn from_config(config: ServerConfig) -> AppResult<Self> {
        config.validate()?;
        let rates = Arc::new(RateService::from_config(config.rate.clone())?);
        Ok(Self::new(config, rates))
    }

    /// Start the background refresh and begin serving.
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip(self))]
    pub fn start(&self) -> AppResult<()> {
        let mut state = self.state.write();
        if *state != AppState::Starting {
            return Err(AppError::InvalidState(*state));
        }

        let handle = RefreshScheduler::spawn(self.rates.clone(), self.config.refresh_schedule());
        *self.scheduler.lock() = Some(handle);
        *state = AppState::Running;

        info!("Application started");
        Ok(())
    }

    /// Stop the background refresh. Idempotent; a stop already in progress
    /// is left to finish.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        {
            let mut state = self.state.write();
            if state.is_terminal() || *state == AppState::ShuttingDown {
                return;
            }
            *state = AppState::ShuttingDown;
        }

        let handle = self.scheduler.lock().take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }

        *self.state.write() = AppState::Stopped;

        let metrics = self.rates.metrics();
        info!(
            cache_hits = metrics.cache_hits,
            cache_misses = metrics.cache_misses,
            refresh_attempts = metrics.refresh_attempts,
            refresh_failures = metrics.refresh_failures,
            scheduled_failures = metrics.scheduled_failures,
            "Application stopped"
        );
    }

    /// Fill the cache once so the first request does not pay for the fetch.
    pub async fn warm_up(&self) -> RateResult<Rate> {
        self.rates.refresh_rate().await
    }

    /// Get current state.
    pub fn state(&self) -> AppState {
        *self.state.read()
    }

    /// Handle a request for the current exchange rate.
    pub async fn exchange_rate(&self) -> Result<ExchangeRateResponse, ErrorResponse> {
        self.ensure_running("Failed to fetch exchange rate")?;

        match self.rates.get_rate().await {
            Ok(rate) => Ok(ExchangeRateResponse {
                exchange_rate: rate,
            }),
            Err(e) => Err(unavailable("Failed to fetch exchange rate", &e)),
        }
    }

    /// Handle a conversion request for `amount_source`.
    pub async fn create_transaction(
        &self,
        amount_source: Decimal,
    ) -> Result<TransactionResponse, ErrorResponse> {
        self.ensure_running("Failed to create transaction")?;

        match self.transactions.create_transaction(amount_source).await {
            Ok(tx) => Ok(tx.into()),
            Err(e @ LedgerError::InvalidAmount(_)) => Err(ErrorResponse::bad_request(format!(
                "Invalid transaction request: {e}"
            ))),
            Err(LedgerError::Rate(e)) => Err(unavailable("Failed to create transaction", &e)),
        }
    }

    /// List recorded conversions, newest first.
    pub async fn list_transactions(&self) -> Result<Vec<TransactionResponse>, ErrorResponse> {
        self.ensure_running("Failed to list transactions")?;

        match self.transactions.find_all().await {
            Ok(all) => Ok(all.into_iter().map(TransactionResponse::from).collect()),
            Err(e) => {
                error!(error = %e, "Failed to list transactions");
                Err(ErrorResponse::service_unavailable(
                    "Failed to list transactions: Service unavailable",
                ))
            }
        }
    }

    fn ensure_running(&self, context: &str) -> Result<(), ErrorResponse> {
        let state = self.state();
        if state.accepts_requests() {
            return Ok(());
        }
        warn!(state = ?state, "Request rejected, application not running");
        Err(ErrorResponse::service_unavailable(format!(
            "{context}: Service unavailable"
        )))
    }
}

fn unavailable(context: &str, err: &RateError) -> ErrorResponse {
    error!(
        error = %err,
        code = err.error_code(),
        last_error = ?err.last_error().map(|le| le.to_string()),
        "{}",
        context
    );
    ErrorResponse::service_unavailable(format!("{context}: {}", err.public_message()))
}
