//! Request and response bodies of the HTTP surface.

use std::str::FromStr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use xrate_common::Rate;
use xrate_ledger::Transaction;

/// Request field carrying the source amount.
pub const AMOUNT_FIELD: &str = "amountEUR";

/// Current exchange rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateResponse {
    pub exchange_rate: Rate,
}

/// Body of a conversion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateTransactionRequest {
    pub amount_source: Decimal,
}

impl CreateTransactionRequest {
    /// Parse a JSON body. The amount may be a JSON number or a numeric string.
    pub fn from_json(body: &[u8]) -> Result<Self, ErrorResponse> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|_| ErrorResponse::bad_request("Request body must be valid JSON"))?;

        let amount = match value.get(AMOUNT_FIELD) {
            Some(Value::Number(n)) => parse_decimal(&n.to_string()),
            Some(Value::String(s)) => parse_decimal(s.trim()),
            _ => None,
        };

        amount
            .map(|amount_source| Self { amount_source })
            .ok_or_else(|| ErrorResponse::bad_request(format!("{AMOUNT_FIELD} must be a number")))
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// A recorded conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    #[serde(rename = "amountEUR", with = "rust_decimal::serde::float")]
    pub amount_source: Decimal,
    #[serde(rename = "amountPLN", with = "rust_decimal::serde::float")]
    pub amount_target: Decimal,
    pub exchange_rate: Rate,
    pub timestamp: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            amount_source: tx.amount_source,
            amount_target: tx.amount_target,
            exchange_rate: tx.rate,
            timestamp: tx.timestamp,
        }
    }
}

/// Liveness body served at the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: u16,
}

/// Error body. Never carries internal failure detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
}

impl ErrorResponse {
    pub const BAD_REQUEST: u16 = 400;
    pub const SERVICE_UNAVAILABLE: u16 = 503;

    /// The request itself was invalid.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status_code: Self::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// A dependency failed.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self {
            status_code: Self::SERVICE_UNAVAILABLE,
            message: message.into(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
