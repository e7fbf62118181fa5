//! Deployment engine contract.

use std::sync::Arc;

use async_trait::async_trait;
use cloudbench_core::{ClientProvider, CredentialSet};

use crate::error::DeployResult;

/// Provisions, or points at, a target cloud and hands out its credentials.
#[async_trait]
pub trait DeployEngine: Send + Sync {
    /// Engine name as used in the `type` field of a deployment config.
    fn name(&self) -> &str;

    /// Makes the cloud available and returns the credentials to run with.
    /// Service clients are built through `provider`.
    async fn deploy(&self, provider: Arc<dyn ClientProvider>) -> DeployResult<CredentialSet>;

    /// Tears down whatever `deploy` created.
    async fn cleanup(&self) -> DeployResult<()>;
}
