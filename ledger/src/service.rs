//! Conversion recording.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};
use xrate_fx::{convert, RateSource};

use crate::error::{LedgerError, LedgerResult};
use crate::store::TransactionStore;
use crate::transaction::Transaction;

/// Computes conversions at the current rate and records them.
pub struct TransactionService {
    rates: Arc<dyn RateSource>,
    store: Arc<dyn TransactionStore>,
}

impl TransactionService {
    /// Create a new transaction service.
    pub fn new(rates: Arc<dyn RateSource>, store: Arc<dyn TransactionStore>) -> Self {
        Self { rates, store }
    }

    /// Convert `amount_source` at the current rate and record the result.
    #[instrument(skip(self))]
    pub async fn create_transaction(&self, amount_source: Decimal) -> LedgerResult<Transaction> {
        if amount_source <= Decimal::ZERO {
            warn!("Rejected non-positive amount");
            return Err(LedgerError::InvalidAmount(amount_source));
        }

        let rate = self.rates.current_rate().await?;
        let amount_target = convert(amount_source, rate)?;

        let transaction = self
            .store
            .append(Transaction::new(amount_source, amount_target, rate))
            .await?;

        info!(
            transaction_id = %transaction.id,
            rate = %rate,
            amount_target = %amount_target,
            "Transaction recorded"
        );

        Ok(transaction)
    }

    /// All recorded transactions, newest first.
    pub async fn find_all(&self) -> LedgerResult<Vec<Transaction>> {
        self.store.list_desc().await
    }
}
