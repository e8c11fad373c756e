//! Transaction storage.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::LedgerResult;
use crate::transaction::Transaction;

/// Append-only storage for conversion records.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Persist a new record.
    async fn append(&self, transaction: Transaction) -> LedgerResult<Transaction>;

    /// All records, newest first.
    async fn list_desc(&self) -> LedgerResult<Vec<Transaction>>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryTransactionStore {
    records: RwLock<Vec<Transaction>>,
}

impl InMemoryTransactionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn append(&self, transaction: Transaction) -> LedgerResult<Transaction> {
        self.records.write().push(transaction.clone());
        Ok(transaction)
    }

    async fn list_desc(&self) -> LedgerResult<Vec<Transaction>> {
        // Reverse first so equal timestamps keep newest-insert-first order.
        let mut records: Vec<Transaction> = self.records.read().iter().rev().cloned().collect();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }
}
