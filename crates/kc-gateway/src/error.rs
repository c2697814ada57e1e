//! Gateway error types.

use kc_admin_client::{ClientError, ClientResult, ErrorKind};
use thiserror::Error;

/// Errors returned by gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// An implemented operation failed.
    #[error("{operation} failed: {message}")]
    OperationFailed {
        /// Operation name (e.g., "create_realm").
        operation: &'static str,
        /// Failure classification.
        kind: ErrorKind,
        /// Cause message.
        message: String,
    },

    /// The operation exists but is not supported.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}

impl GatewayError {
    /// Creates an operation failure.
    #[must_use]
    pub fn failed(operation: &'static str, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::OperationFailed {
            operation,
            kind,
            message: message.into(),
        }
    }

    /// Wraps an admin client error.
    #[must_use]
    pub fn from_client(operation: &'static str, err: &ClientError) -> Self {
        Self::failed(operation, err.kind(), err.to_string())
    }

    /// Returns the failure classification; `None` for unsupported operations.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::OperationFailed { kind, .. } => Some(*kind),
            Self::NotImplemented(_) => None,
        }
    }

    /// Returns the operation name.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::OperationFailed { operation, .. } | Self::NotImplemented(operation) => operation,
        }
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Attaches the operation name to admin client failures.
pub(crate) trait OperationContext<T> {
    fn during(self, operation: &'static str) -> GatewayResult<T>;
}

impl<T> OperationContext<T> for ClientResult<T> {
    fn during(self, operation: &'static str) -> GatewayResult<T> {
        self.map_err(|err| GatewayError::from_client(operation, &err))
    }
}
