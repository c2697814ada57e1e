//! Gateway API error types.
//!
//! Maps gateway failures to HTTP responses with a JSON body
//! `{"error": code, "error_description": message}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kc_gateway::{ErrorKind, GatewayError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by gateway handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A gateway operation failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The request itself was malformed.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Returns the HTTP status for a failure classification.
#[must_use]
pub const fn kind_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Rejected => StatusCode::BAD_REQUEST,
        // The gateway's own upstream credentials failed, not the caller's.
        ErrorKind::Unauthorized => StatusCode::BAD_GATEWAY,
        ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Gateway(GatewayError::OperationFailed { kind, .. }) => kind_status(*kind),
            Self::Gateway(GatewayError::NotImplemented(_)) => StatusCode::NOT_IMPLEMENTED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Gateway(GatewayError::OperationFailed { kind, .. }) => kind.code(),
            Self::Gateway(GatewayError::NotImplemented(_)) => "not_implemented",
            Self::BadRequest(_) => "bad_request",
        }
    }
}

/// API error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error: String,
    /// Human-readable error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: self.error_code().to_string(),
            error_description: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for gateway handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_failure_follows_kind() {
        let err = ApiError::from(GatewayError::failed(
            "create_realm",
            ErrorKind::Conflict,
            "Realm already exists: r1",
        ));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), "conflict");
        assert!(err.to_string().contains("create_realm"));
    }

    #[test]
    fn upstream_auth_failure_is_bad_gateway() {
        let err = ApiError::from(GatewayError::failed("list_roles", ErrorKind::Unauthorized, "401"));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn not_implemented() {
        let err = ApiError::from(GatewayError::NotImplemented("delete_permission"));
        assert_eq!(err.status_code(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(err.error_code(), "not_implemented");
    }
}
