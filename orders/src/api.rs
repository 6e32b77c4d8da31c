use crate::errors::OrdersError;
use crate::metrics_defs::{ORDERS_CREATED, ORDERS_DELETED, ORDERS_UPDATED};
use crate::model::{NewOrder, Order, OrderChanges};
use crate::store::{OrderFilter, OrderStore};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router, middleware};
use serde::Deserialize;
use serde_json::{Value, json};
use shared::access_log::access_log;
use shared::cors::cors_layer;
use shared::validation::parse_json_object;
use uuid::Uuid;

pub fn router(store: OrderStore) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/orders", get(list_orders).post(create_order))
        .route(
            "/orders/{id}",
            get(get_order).put(update_order).delete(delete_order),
        )
        .layer(middleware::from_fn(access_log))
        .layer(cors_layer())
        .with_state(store)
}

async fn healthz() -> Json<Value> {
    Json(json!({"status": "ok", "service": "ms-orders"}))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderQuery {
    project_id: Option<String>,
    status: Option<String>,
}

async fn list_orders(
    State(store): State<OrderStore>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<Order>>, OrdersError> {
    // blank filters match everything
    let filter = OrderFilter {
        project_id: query.project_id.filter(|v| !v.is_empty()),
        status: query.status.filter(|v| !v.is_empty()),
    };
    Ok(Json(store.list(filter).await?))
}

async fn create_order(
    State(store): State<OrderStore>,
    body: Bytes,
) -> Result<(StatusCode, Json<Order>), OrdersError> {
    let new = NewOrder::from_json(&parse_json_object(&body)?)?;
    let order = store.create(new).await?;

    shared::counter!(ORDERS_CREATED).increment(1);
    tracing::debug!(id = %order.id, project_id = %order.project_id, "order created");
    Ok((StatusCode::CREATED, Json(order)))
}

async fn get_order(
    State(store): State<OrderStore>,
    Path(id): Path<String>,
) -> Result<Json<Order>, OrdersError> {
    let id = Uuid::parse_str(&id)?;
    store.get(id).await?.map(Json).ok_or(OrdersError::NotFound)
}

async fn update_order(
    State(store): State<OrderStore>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Order>, OrdersError> {
    let changes = OrderChanges::from_json(&parse_json_object(&body)?)?;
    let id = Uuid::parse_str(&id)?;
    let order = store
        .update(id, changes)
        .await?
        .ok_or(OrdersError::NotFound)?;

    shared::counter!(ORDERS_UPDATED, "status" => order.status.clone()).increment(1);
    tracing::debug!(id = %order.id, status = %order.status, "order updated");
    Ok(Json(order))
}

async fn delete_order(
    State(store): State<OrderStore>,
    Path(id): Path<String>,
) -> Result<StatusCode, OrdersError> {
    let id = Uuid::parse_str(&id)?;
    if !store.delete(id).await? {
        return Err(OrdersError::NotFound);
    }
    shared::counter!(ORDERS_DELETED).increment(1);
    Ok(StatusCode::NO_CONTENT)
}
