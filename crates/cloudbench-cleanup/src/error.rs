//! Error types for the cleanup subsystem.

use cloudbench_core::{CloudError, CoreError};
use thiserror::Error;

/// Errors raised by cleanup configuration and listing.
///
/// Only the misuse variants ever escape [`crate::CleanupOrchestrator::cleanup`];
/// remote failures are captured in the report.
#[derive(Debug, Error)]
pub enum CleanupError {
    /// Selector names nothing in the registry.
    #[error("no registered resource matches selector `{0}`")]
    UnknownSelector(String),

    /// Selector is not of the form `service` or `service.resource`.
    #[error("invalid resource selector `{0}`: expected `service` or `service.resource`")]
    InvalidSelector(String),

    /// Resource spec values are out of range.
    #[error("invalid resource spec `{resource}`: {message}")]
    InvalidSpec {
        /// `service.resource` key.
        resource: String,
        /// What is wrong with it.
        message: String,
    },

    /// A selected resource type needs the admin credential, which is absent.
    #[error("`{resource}` requires an admin credential but none was supplied")]
    MissingAdminCredential {
        /// `service.resource` key.
        resource: String,
    },

    /// The credential set holds neither an admin nor any user.
    #[error("no credentials supplied for cleanup")]
    NoCredentials,

    /// Client lookup failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Remote call failed.
    #[error(transparent)]
    Cloud(#[from] CloudError),
}

impl CleanupError {
    /// Creates an `InvalidSpec` variant.
    #[must_use]
    pub fn invalid_spec(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSpec {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Whether this error is a caller mistake rather than a remote failure.
    #[must_use]
    pub fn is_misuse(&self) -> bool {
        !matches!(self, Self::Core(_) | Self::Cloud(_))
    }
}

/// Result alias for cleanup operations.
pub type CleanupResult<T> = Result<T, CleanupError>;
