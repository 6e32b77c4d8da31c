use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shared::config::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FunctionError {
    #[error("{0}")]
    InvalidBody(String),

    /// The downstream answered with a non-success status.
    #[error("{message}")]
    Downstream { status: StatusCode, message: String },

    /// The downstream could not be reached or its answer not read.
    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    InvalidResponse(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FunctionError {
    pub fn status(&self) -> StatusCode {
        match self {
            FunctionError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            FunctionError::Downstream { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `{ "error": message }` with this error's status; `fallback` stands in
    /// for an empty message.
    pub fn into_response_with(self, fallback: &str) -> Response {
        let status = self.status();
        let mut message = self.to_string();
        if message.is_empty() {
            message = fallback.to_string();
        }
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "function failed");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn render(err: FunctionError, fallback: &str) -> (StatusCode, Value) {
        let response = err.into_response_with(fallback);
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_responses() {
        assert_eq!(
            render(
                FunctionError::Downstream {
                    status: StatusCode::NOT_FOUND,
                    message: "not found".into()
                },
                "receipt failed"
            )
            .await,
            (StatusCode::NOT_FOUND, json!({"error": "not found"}))
        );
        assert_eq!(
            render(FunctionError::Transport(String::new()), "ingest failed").await,
            (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "ingest failed"}))
        );
        assert_eq!(
            render(FunctionError::InvalidBody("orderId is required".into()), "x").await,
            (StatusCode::BAD_REQUEST, json!({"error": "orderId is required"}))
        );
    }
}
