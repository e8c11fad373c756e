//! Exchange rate value type.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InvalidRate;

/// Units of target currency per one unit of source currency.
///
/// A `Rate` can only be built from a finite number strictly greater than
/// zero, so any `Rate` held by the cache or the ledger is already valid.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rate(f64);

impl Rate {
    /// Validate a raw number as a rate.
    pub fn new(value: f64) -> Result<Self, InvalidRate> {
        if !value.is_finite() {
            return Err(InvalidRate::NotFinite(value));
        }
        if value <= 0.0 {
            return Err(InvalidRate::NotPositive(value));
        }
        Ok(Self(value))
    }

    /// Get the raw value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Rate {
    type Error = InvalidRate;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Rate::new(value)
    }
}

impl From<Rate> for f64 {
    fn from(rate: Rate) -> Self {
        rate.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
