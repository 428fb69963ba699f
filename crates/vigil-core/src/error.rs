//! Error types for backend facade calls.

use std::error::Error;

use thiserror::Error;
use vigil_api_models::ProjectKey;

/// Primary error type for facade operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The referenced project does not exist.
    #[error("project not found")]
    NotFound {
        /// Missing project key.
        key: ProjectKey,
    },
    /// The current user may not perform the operation.
    #[error("permission denied")]
    PermissionDenied {
        /// Operation identifier.
        operation: &'static str,
    },
    /// The backend refused the request.
    #[error("{message}")]
    Rejected {
        /// Operation identifier.
        operation: &'static str,
        /// Message returned by the backend, shown verbatim to the user.
        message: String,
    },
    /// The backend could not be reached or answered with garbage.
    #[error("backend unavailable")]
    Unavailable {
        /// Operation identifier.
        operation: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl ServiceError {
    /// Build a rejection carrying the backend message.
    #[must_use]
    pub fn rejected(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Rejected {
            operation,
            message: message.into(),
        }
    }

    /// Operation identifier when one was recorded.
    #[must_use]
    pub const fn operation(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => None,
            Self::PermissionDenied { operation }
            | Self::Rejected { operation, .. }
            | Self::Unavailable { operation, .. } => Some(operation),
        }
    }
}

/// Convenience alias for facade results.
pub type ServiceResult<T> = Result<T, ServiceError>;
