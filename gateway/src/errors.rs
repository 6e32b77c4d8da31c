use http::StatusCode;
use shared::config::ValidationError;
use thiserror::Error;

/// Errors that can occur while serving gateway requests
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Failed to read request body: {0}")]
    RequestBodyError(String),

    #[error("Failed to read response body: {0}")]
    ResponseBodyError(String),

    #[error("Upstream request failed for {0}: {1}")]
    UpstreamRequestFailed(String, String),

    #[error("Upstream timeout for {0}")]
    UpstreamTimeout(String),

    /// The upstream answered, but not with a success status.
    #[error("{message}")]
    UpstreamStatus { status: StatusCode, message: String },

    #[error("Invalid JSON from {0}: {1}")]
    InvalidUpstreamJson(String, String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Status the client is answered with. Only an upstream's own failure
    /// status is passed on; everything else is a 500.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::UpstreamStatus { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
