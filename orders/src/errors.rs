use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shared::config::ValidationError;
use shared::db::DbError;
use shared::validation::ValidationErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrdersError {
    #[error("invalid request body")]
    Validation(#[from] ValidationErrors),

    #[error("invalid id")]
    InvalidId,

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Database(#[from] DbError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<uuid::Error> for OrdersError {
    fn from(_: uuid::Error) -> Self {
        OrdersError::InvalidId
    }
}

impl IntoResponse for OrdersError {
    fn into_response(self) -> Response {
        let status = match &self {
            OrdersError::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": errors }))).into_response();
            }
            OrdersError::InvalidId => StatusCode::BAD_REQUEST,
            OrdersError::NotFound => StatusCode::NOT_FOUND,
            OrdersError::Database(_) | OrdersError::Config(_) | OrdersError::Io(_) => {
                tracing::error!(error = %self, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
