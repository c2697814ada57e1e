//! Admin client error types.

use serde::Serialize;
use thiserror::Error;

/// Classification of an upstream failure.
///
/// Lets callers tell retryable failures from terminal ones without
/// inspecting status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The addressed entity does not exist.
    NotFound,
    /// The entity already exists or the change conflicts with server state.
    Conflict,
    /// The admin credentials were rejected or lack permission.
    Unauthorized,
    /// Network failure, timeout, throttling or server-side error.
    Transient,
    /// The server (or the gateway) refused the request as invalid.
    Rejected,
    /// Anything else.
    #[serde(rename = "internal_error")]
    Internal,
}

impl ErrorKind {
    /// Classifies an HTTP status code returned by the admin API.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            409 => Self::Conflict,
            401 | 403 => Self::Unauthorized,
            408 | 429 | 500..=599 => Self::Transient,
            400..=499 => Self::Rejected,
            _ => Self::Internal,
        }
    }

    /// Returns true if repeating the call may succeed.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transient)
    }

    /// Returns the snake_case code used in API error bodies.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Unauthorized => "unauthorized",
            Self::Transient => "transient",
            Self::Rejected => "rejected",
            Self::Internal => "internal_error",
        }
    }
}

/// Errors returned by an [`AdminClient`](crate::AdminClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// Entity not found.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Type of entity (e.g., "Realm", "User").
        resource: &'static str,
        /// Entity identifier or name.
        id: String,
    },

    /// Entity already exists.
    #[error("{resource} already exists: {id}")]
    Conflict {
        /// Type of entity.
        resource: &'static str,
        /// Conflicting identifier or name.
        id: String,
    },

    /// Token acquisition failed.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The admin API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with something we could not interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(resource: &'static str, id: impl Into<String>) -> Self {
        Self::Conflict {
            resource,
            id: id.into(),
        }
    }

    /// Classifies this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Auth(_) => ErrorKind::Unauthorized,
            Self::Api { status, .. } => ErrorKind::from_status(*status),
            Self::Http(err) => {
                if err.is_timeout() || err.is_connect() {
                    ErrorKind::Transient
                } else if let Some(status) = err.status() {
                    ErrorKind::from_status(status.as_u16())
                } else {
                    ErrorKind::Internal
                }
            }
            Self::InvalidResponse(_) => ErrorKind::Internal,
        }
    }

    /// Returns true for not found errors.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Result type for admin client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(ErrorKind::from_status(404), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_status(409), ErrorKind::Conflict);
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_status(403), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_status(429), ErrorKind::Transient);
        assert_eq!(ErrorKind::from_status(503), ErrorKind::Transient);
        assert_eq!(ErrorKind::from_status(400), ErrorKind::Rejected);
        assert_eq!(ErrorKind::from_status(302), ErrorKind::Internal);
    }

    #[test]
    fn only_transient_is_retryable() {
        assert!(ErrorKind::Transient.is_retryable());
        assert!(!ErrorKind::NotFound.is_retryable());
        assert!(!ErrorKind::Conflict.is_retryable());
    }

    #[test]
    fn api_error_kind_follows_status() {
        let err = ClientError::Api {
            status: 409,
            message: "Conflict detected".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.to_string().contains("409"));
    }

    #[test]
    fn not_found_helper() {
        let err = ClientError::not_found("Role", "editor");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Role not found: editor");
    }
}
