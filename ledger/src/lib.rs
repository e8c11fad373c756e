//! xrate Ledger
//!
//! Append-only record of computed conversions. Each conversion reads the
//! current rate once, stores source amount, target amount and the rate used,
//! and can be listed back newest first.

pub mod error;
pub mod transaction;
pub mod store;
pub mod service;

pub use error::{LedgerError, LedgerResult};
pub use transaction::Transaction;
pub use store::{InMemoryTransactionStore, TransactionStore};
pub use service::TransactionService;
