use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::DomainError;

/// API error type with HTTP status code, machine-readable code and message
///
/// Renders as `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// Creates a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// Creates a 405 Method Not Allowed error
    pub fn method_not_allowed() -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "METHOD_NOT_ALLOWED",
            "method not allowed",
        )
    }

    /// Creates a 408 Request Timeout error
    pub fn request_timeout() -> Self {
        Self::new(
            StatusCode::REQUEST_TIMEOUT,
            "INTERNAL_ERROR",
            "request timed out",
        )
    }

    /// Creates a 409 Conflict error with a domain code
    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        }));

        (self.status, body).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::TeamExists(_) => {
                Self::new(StatusCode::BAD_REQUEST, "TEAM_EXISTS", message)
            }
            DomainError::PrExists(_) => Self::conflict("PR_EXISTS", message),
            DomainError::NotFound(_) => Self::not_found(message),
            DomainError::PrMerged(_) => Self::conflict("PR_MERGED", message),
            DomainError::NotAssigned { .. } => Self::conflict("NOT_ASSIGNED", message),
            DomainError::NoCandidate(_) => Self::conflict("NO_CANDIDATE", message),
            DomainError::BulkDeactivateFailed { .. } => {
                tracing::warn!(error = %message, "bulk deactivation rejected");
                Self::conflict(
                    "BULK_DEACTIVATE_FAILED",
                    "cannot deactivate users - some PRs cannot be reassigned",
                )
            }
            DomainError::Validation(_) => Self::bad_request(message),
            DomainError::BulkDeactivateInterrupted { .. } | DomainError::Storage(_) => {
                tracing::error!(error = %message, "request failed");
                Self::internal_server_error(message)
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "rejected request body");
        Self::bad_request("invalid JSON")
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}
