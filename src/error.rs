//! Error handling for the FridgeScan service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Camera permission refused (session-fatal)
    #[error("Camera permission denied")]
    PermissionDenied,

    /// Text/barcode recognition failed for one frame
    #[error("Recognition failed: {0}")]
    Recognition(String),

    /// Product lookup could not reach the remote service
    #[error("Product lookup connection failed: {0}")]
    LookupNetwork(String),

    /// Product database has no entry for the barcode
    #[error("Product not found: {0}")]
    LookupNotFound(String),

    /// Product lookup response body was malformed
    #[error("Product lookup parsing error: {0}")]
    LookupParse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote API error (recipe / expiry stats services)
    #[error("API error: {0}")]
    Api(String),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            Error::PermissionDenied => (
                StatusCode::FORBIDDEN,
                "PERMISSION_DENIED",
                "Camera permission denied".to_string(),
            ),
            Error::Recognition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "RECOGNITION_ERROR",
                msg.clone(),
            ),
            Error::LookupNetwork(msg) => (
                StatusCode::BAD_GATEWAY,
                "LOOKUP_NETWORK_ERROR",
                msg.clone(),
            ),
            Error::LookupNotFound(msg) => (
                StatusCode::NOT_FOUND,
                "PRODUCT_NOT_FOUND",
                msg.clone(),
            ),
            Error::LookupParse(msg) => (
                StatusCode::BAD_GATEWAY,
                "LOOKUP_PARSE_ERROR",
                msg.clone(),
            ),
            Error::Serialization(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERIALIZATION_ERROR",
                e.to_string(),
            ),
            Error::Http(e) => (StatusCode::BAD_GATEWAY, "HTTP_ERROR", e.to_string()),
            Error::Api(msg) => (StatusCode::BAD_GATEWAY, "API_ERROR", msg.clone()),
            Error::Parse(msg) => (StatusCode::BAD_REQUEST, "PARSE_ERROR", msg.clone()),
            Error::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        tracing::error!(
            status = %status,
            error_code = %error_code,
            message = %message,
            "Request error"
        );

        let body = Json(json!({
            "error_code": error_code,
            "message": message
        }));

        (status, body).into_response()
    }
}
