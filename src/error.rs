// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
///
/// Every variant except `InternalServerError` is a recoverable-by-caller
/// condition: the engine is deterministic, so retrying the same inputs
/// reproduces the same error and no retry loop lives below this boundary.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error (collaborator failures, never partial state)
    InternalServerError(String),

    // 400 Bad Request (answer-count mismatch, malformed quiz configuration)
    ValidationError(String),

    // 401 Unauthorized (no/invalid session)
    Unauthorized(String),

    // 403 Forbidden (acting on another student's attempt without elevated role)
    OwnershipViolation(String),

    // 403 Forbidden (no registration for the course)
    NotEnrolled(String),

    // 403 Forbidden (before start, or past due without accommodation)
    AccessWindowClosed(String),

    // 404 Not Found (unknown attempt/exercise/week)
    NotFound(String),

    // 409 Conflict (operation illegal for the current attempt status)
    InvalidState(String),

    // 409 Conflict (e.g., duplicate username)
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal Server Error".to_string(),
                )
            }
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, "validation", msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            AppError::OwnershipViolation(msg) => (StatusCode::FORBIDDEN, "ownership", msg),
            AppError::NotEnrolled(msg) => (StatusCode::FORBIDDEN, "notEnrolled", msg),
            AppError::AccessWindowClosed(msg) => (StatusCode::FORBIDDEN, "accessWindowClosed", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "notFound", msg),
            AppError::InvalidState(msg) => (StatusCode::CONFLICT, "invalidState", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
        };
        let body = Json(json!({
            "code": code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Converts `sqlx::Error` into `AppError::InternalServerError`.
/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ValidationError(err.to_string())
    }
}
