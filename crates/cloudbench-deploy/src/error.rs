use cloudbench_core::CoreError;
use thiserror::Error;

/// Errors raised while deploying or describing a target cloud.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Deployment config is well-formed JSON but semantically wrong.
    #[error("invalid deployment config: {0}")]
    InvalidConfig(String),

    /// Deployment config is not valid JSON for the engine.
    #[error("failed to parse deployment config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Credentials built from the config were rejected.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl DeployError {
    /// Creates an `InvalidConfig` variant.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

/// Result alias for deployment operations.
pub type DeployResult<T> = Result<T, DeployError>;
