use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use tracing::error;

use crate::models::{RepositoryError, ServiceError};

/// Error tuple returned by every JSON handler
pub type ApiError = (StatusCode, Json<Value>);

/// Uniform error body
pub fn error_body(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(json!({
            "status": "error",
            "error": message.into(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

/// Convert service errors to HTTP responses
pub fn service_error_to_response(err: ServiceError) -> ApiError {
    let (status, message) = match err {
        ServiceError::ProductNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::CartNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::ItemNotInCart { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::InvalidIdentifier { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::ValidationError { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        ServiceError::Repository { source } => {
            error!(error = %source, "Store operation failed");
            match source {
                RepositoryError::NotFound => {
                    (StatusCode::NOT_FOUND, "Resource not found".to_string())
                }
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                ),
            }
        }
    };

    error_body(status, message)
}

/// Malformed or mistyped JSON bodies are client errors
pub fn json_rejection_to_response(rejection: JsonRejection) -> ApiError {
    error_body(
        StatusCode::BAD_REQUEST,
        format!("Invalid request body: {}", rejection.body_text()),
    )
}

/// Fallback for unknown API routes
pub async fn not_found() -> Response {
    error_body(StatusCode::NOT_FOUND, "Resource not found").into_response()
}
