//! Error types shared by the cloudbench crates.

use thiserror::Error;

/// Canonical error type for core operations (credentials, client lookup).
#[derive(Debug, Error)]
pub enum CoreError {
    /// No client can be built for the requested service.
    #[error("service `{service}` is not available for this credential")]
    UnknownService {
        /// Logical service name (e.g. `"nova"`).
        service: String,
    },

    /// Credential or credential set is malformed or inconsistent.
    #[error("invalid credential: {message}")]
    InvalidCredential {
        /// Human-readable explanation.
        message: String,
    },
}

impl CoreError {
    /// Creates an `UnknownService` variant.
    #[must_use]
    pub fn unknown_service(service: impl Into<String>) -> Self {
        Self::UnknownService {
            service: service.into(),
        }
    }

    /// Creates an `InvalidCredential` variant.
    #[must_use]
    pub fn invalid_credential(message: impl Into<String>) -> Self {
        Self::InvalidCredential {
            message: message.into(),
        }
    }
}

/// Convenient result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
