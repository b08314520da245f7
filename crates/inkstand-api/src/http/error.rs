//! Function error type mapping to `{message}` JSON responses.
//!
//! Every failure the function reports is a 500 except a wrong method, and
//! every response carries the CORS headers.

use axum::Json;
use axum::http::StatusCode;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    HeaderName,
};
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    /// Anything but POST or OPTIONS.
    MethodNotAllowed,
    /// Malformed or incomplete request.
    Invalid(String),
    /// Synthesis, CMS or upload failure.
    Internal(String),
}

/// CORS headers attached to every function response.
pub fn cors_headers() -> [(HeaderName, &'static str); 3] {
    [
        (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        (ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
    ]
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
            }
            AppError::Invalid(message) => {
                tracing::warn!(%message, "rejected text-to-speech request");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            AppError::Internal(message) => {
                tracing::error!(%message, "text-to-speech request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        (status, cors_headers(), Json(json!({ "message": message }))).into_response()
    }
}
