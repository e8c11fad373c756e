//! Currency conversion arithmetic.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use xrate_common::Rate;

use crate::error::{RateError, RateResult};

/// Decimal places kept on converted amounts.
pub const AMOUNT_DECIMAL_PLACES: u32 = 2;

/// Convert `amount` at `rate`.
///
/// The exact product is rounded once, half-up, to two decimal places.
pub fn convert(amount: Decimal, rate: Rate) -> RateResult<Decimal> {
    let rate = rate_to_decimal(rate)?;
    let product = amount
        .checked_mul(rate)
        .ok_or_else(|| RateError::Validation(format!("{amount} x {rate} overflows")))?;

    Ok(product.round_dp_with_strategy(
        AMOUNT_DECIMAL_PLACES,
        RoundingStrategy::MidpointAwayFromZero,
    ))
}

/// Exact decimal form of a rate.
pub fn rate_to_decimal(rate: Rate) -> RateResult<Decimal> {
    Decimal::from_f64(rate.value())
        .ok_or_else(|| RateError::Validation(format!("rate {rate} has no decimal form")))
}
