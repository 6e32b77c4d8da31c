use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shared::config::ValidationError;
use shared::db::DbError;
use shared::validation::ValidationErrors;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectsError {
    #[error("invalid request body")]
    Validation(#[from] ValidationErrors),

    #[error("invalid id")]
    InvalidId,

    #[error("not found")]
    NotFound,

    #[error("invalid search pattern: {0}")]
    InvalidSearch(#[from] regex::Error),

    #[error("{0}")]
    Database(#[from] DbError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<crate::ids::InvalidId> for ProjectsError {
    fn from(_: crate::ids::InvalidId) -> Self {
        ProjectsError::InvalidId
    }
}

impl IntoResponse for ProjectsError {
    fn into_response(self) -> Response {
        let status = match &self {
            ProjectsError::Validation(errors) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": errors }))).into_response();
            }
            ProjectsError::InvalidId | ProjectsError::InvalidSearch(_) => StatusCode::BAD_REQUEST,
            ProjectsError::NotFound => StatusCode::NOT_FOUND,
            ProjectsError::Database(_) | ProjectsError::Config(_) | ProjectsError::Io(_) => {
                tracing::error!(error = %self, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
