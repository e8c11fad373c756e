//! Conversion record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use xrate_common::Rate;

/// One computed conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Unique transaction ID.
    pub id: Uuid,
    /// Amount in source currency.
    pub amount_source: Decimal,
    /// Amount in target currency, rounded to two places.
    pub amount_target: Decimal,
    /// Rate applied.
    pub rate: Rate,
    /// When the conversion was recorded.
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Create a new record stamped now.
    pub fn new(amount_source: Decimal, amount_target: Decimal, rate: Rate) -> Self {
        Self {
            id: Uuid::now_v7(),
            amount_source,
            amount_target,
            rate,
            timestamp: Utc::now(),
        }
    }
}
