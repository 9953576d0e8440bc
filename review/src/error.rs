use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use scoring::ValidationError;
use serde_json::json;
use std::error::Error;
use thiserror::Error;

/// Error surface of the HTTP handlers, rendered as the JSON envelope
/// `{"error": "..."}` with the matching status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    BadRequest(String),
    #[error("Internal server error")]
    Internal(#[source] Box<dyn Error + Send + Sync>),
}

impl From<Box<dyn Error + Send + Sync>> for ApiError {
    fn from(err: Box<dyn Error + Send + Sync>) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
