//! HTTP routes.
//!
//! - `GET /` - liveness
//! - `GET /exchange-rate` - current rate
//! - `POST /transaction` - convert an amount and record it
//! - `GET /transaction` - recorded conversions, newest first

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app::App;
use crate::dto::{
    CreateTransactionRequest, ErrorResponse, ExchangeRateResponse, StatusResponse,
    TransactionResponse,
};

/// Build the router over a shared application.
pub fn router(app: Arc<App>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/exchange-rate", get(exchange_rate))
        .route("/transaction", get(list_transactions).post(create_transaction))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app)
}

async fn root() -> Json<StatusResponse> {
    Json(StatusResponse { status: 200 })
}

async fn exchange_rate(
    State(app): State<Arc<App>>,
) -> Result<Json<ExchangeRateResponse>, ErrorResponse> {
    app.exchange_rate().await.map(Json)
}

async fn create_transaction(
    State(app): State<Arc<App>>,
    body: Bytes,
) -> Result<(StatusCode, Json<TransactionResponse>), ErrorResponse> {
    let request = CreateTransactionRequest::from_json(&body)?;
    let transaction = app.create_transaction(request.amount_source).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

async fn list_transactions(
    State(app): State<Arc<App>>,
) -> Result<Json<Vec<TransactionResponse>>, ErrorResponse> {
    app.list_transactions().await.map(Json)
}
