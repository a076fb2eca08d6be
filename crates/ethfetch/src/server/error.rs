use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use ethfetch_core::CoreError;

// ==============================================================================
// Error Type
// ==============================================================================

#[derive(Debug)]
pub(crate) enum AppError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Input faults are the caller's to fix; a failed ledger fetch means the
/// transaction could not be obtained; anything else stays opaque.
pub(super) fn map_core_error(err: CoreError) -> AppError {
    let message = err.to_string();
    match err {
        CoreError::Codec(_) => AppError::BadRequest(message),
        CoreError::FetchFailed => AppError::NotFound(message),
        CoreError::OperationFailed(_) => AppError::Internal(message),
    }
}
