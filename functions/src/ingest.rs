//! `POST /api/ingest-credit`: registers a project and its first credit batch.

use crate::downstream::{Downstream, created_id};
use crate::errors::FunctionError;
use crate::metrics_defs::EVENTS_PROCESSED;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use reqwest::Method;
use serde_json::{Map, Value, json};
use shared::access_log::access_log;
use shared::cors::cors_layer;
use shared::http::upstream_url;
use url::Url;

const FALLBACK_MESSAGE: &str = "ingest failed";

#[derive(Clone)]
pub struct IngestState {
    downstream: Downstream,
    projects_url: Url,
}

impl IngestState {
    pub fn new(projects_url: Url) -> Self {
        IngestState {
            downstream: Downstream::new("ingest-credit"),
            projects_url,
        }
    }
}

pub fn router(state: IngestState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/ingest-credit", post(ingest_credit))
        .layer(middleware::from_fn(access_log))
        .layer(cors_layer())
        .with_state(state)
}

async fn healthz() -> Json<Value> {
    Json(json!({"status": "ok", "service": "ingest-credit"}))
}

async fn ingest_credit(State(state): State<IngestState>, body: Bytes) -> Response {
    match ingest(&state, &body).await {
        Ok(accepted) => (StatusCode::ACCEPTED, Json(accepted)).into_response(),
        Err(e) => e.into_response_with(FALLBACK_MESSAGE),
    }
}

fn object_member(body: &mut Map<String, Value>, name: &str) -> Result<Map<String, Value>, FunctionError> {
    match body.remove(name) {
        Some(Value::Object(member)) => Ok(member),
        _ => Err(FunctionError::InvalidBody(format!("{name} must be an object"))),
    }
}

/// Creates the project, then the batch pointing at it. A failed batch
/// leaves the project behind.
async fn ingest(state: &IngestState, body: &[u8]) -> Result<Value, FunctionError> {
    let mut body = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(body)) => body,
        Ok(_) => return Err(FunctionError::InvalidBody("body must be a JSON object".into())),
        Err(e) => return Err(FunctionError::InvalidBody(format!("invalid JSON body: {e}"))),
    };
    let project = object_member(&mut body, "project")?;
    let mut batch = object_member(&mut body, "batch")?;

    let created = state
        .downstream
        .send_json(
            Method::POST,
            upstream_url(&state.projects_url, &["projects"]),
            &Value::Object(project),
        )
        .await?;
    let project_id = created_id(&created, "project")?;

    batch.insert("projectId".into(), Value::String(project_id.clone()));
    let created = state
        .downstream
        .send_json(
            Method::POST,
            upstream_url(&state.projects_url, &["batches"]),
            &Value::Object(batch),
        )
        .await?;
    let batch_id = created_id(&created, "batch")?;

    shared::counter!(EVENTS_PROCESSED, "function" => "ingest-credit").increment(1);
    tracing::info!(%project_id, %batch_id, "credit ingested");
    Ok(json!({"ok": true, "projectId": project_id, "batchId": batch_id}))
}
