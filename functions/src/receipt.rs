//! `POST /api/receipt-hook`: marks an order as paid.

use crate::downstream::Downstream;
use crate::errors::FunctionError;
use crate::metrics_defs::EVENTS_PROCESSED;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use reqwest::Method;
use serde_json::{Value, json};
use shared::access_log::access_log;
use shared::cors::cors_layer;
use shared::http::upstream_url;
use shared::time::timestamp_now;
use url::Url;

const FALLBACK_MESSAGE: &str = "receipt failed";
/// Order status written once payment arrives. Mirrors `orders::PAID`.
const PAID: &str = "PAID";

#[derive(Clone)]
pub struct ReceiptState {
    downstream: Downstream,
    orders_url: Url,
}

impl ReceiptState {
    pub fn new(orders_url: Url) -> Self {
        ReceiptState {
            downstream: Downstream::new("receipt-hook"),
            orders_url,
        }
    }
}

pub fn router(state: ReceiptState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/receipt-hook", post(receipt_hook))
        .layer(middleware::from_fn(access_log))
        .layer(cors_layer())
        .with_state(state)
}

async fn healthz() -> Json<Value> {
    Json(json!({"status": "ok", "service": "receipt-hook"}))
}

async fn receipt_hook(State(state): State<ReceiptState>, body: Bytes) -> Response {
    match mark_paid(&state, &body).await {
        Ok(()) => (StatusCode::ACCEPTED, Json(json!({"ok": true}))).into_response(),
        Err(e) => e.into_response_with(FALLBACK_MESSAGE),
    }
}

/// Overwrites the order's status; its current state is not checked.
async fn mark_paid(state: &ReceiptState, body: &[u8]) -> Result<(), FunctionError> {
    let body: Value = serde_json::from_slice(body)
        .map_err(|e| FunctionError::InvalidBody(format!("invalid JSON body: {e}")))?;
    let order_id = body
        .get("orderId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| FunctionError::InvalidBody("orderId must be a non-empty string".into()))?;

    state
        .downstream
        .send_json(
            Method::PUT,
            upstream_url(&state.orders_url, &["orders", order_id]),
            &json!({"status": PAID, "processedAt": timestamp_now()}),
        )
        .await?;

    shared::counter!(EVENTS_PROCESSED, "function" => "receipt-hook").increment(1);
    tracing::info!(%order_id, "order marked paid");
    Ok(())
}
