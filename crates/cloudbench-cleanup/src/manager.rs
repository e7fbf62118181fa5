//! Resource manager and plugin contracts.
//!
//! A [`ResourcePlugin`] lists the live instances of one resource type in a
//! scope; each instance is wrapped in a [`ResourceManager`] bound to that
//! scope, which the orchestrator filters, deletes and polls.

use std::sync::Arc;

use async_trait::async_trait;
use cloudbench_core::{CloudResult, RawResource, ResourceId, TenantId};

use crate::error::CleanupResult;
use crate::policy::DeletionPolicy;
use crate::scope::Scope;
use crate::spec::ResourceSpec;

/// One discovered live resource.
#[async_trait]
pub trait ResourceManager: Send + Sync {
    /// Spec of the resource type this instance belongs to.
    fn spec(&self) -> &ResourceSpec;

    /// Scope that discovered this instance.
    fn scope(&self) -> &Scope;

    /// Payload returned by the listing call.
    fn raw(&self) -> &RawResource;

    /// Unique id of the resource.
    fn identity(&self) -> ResourceId {
        ResourceId::new(self.raw().id.clone())
    }

    /// Best-effort display name.
    fn display_name(&self) -> Option<String> {
        self.raw().name.clone()
    }

    /// Owning tenant: as reported by the service, else the scope's tenant.
    fn tenant(&self) -> Option<TenantId> {
        self.raw()
            .tenant_id
            .as_deref()
            .map(TenantId::from)
            .or_else(|| self.scope().tenant())
    }

    /// Whether the policy selects this resource for deletion.
    fn is_deletion_target(&self, policy: &DeletionPolicy) -> bool {
        policy.is_target(&self.spec().service, self.display_name().as_deref())
    }

    /// Re-fetches the resource and reports whether it is gone.
    ///
    /// Never fails: errors other than not-found mean "not yet deleted".
    async fn is_deleted(&self) -> bool;

    /// Issues the delete call.
    async fn delete(&self) -> CloudResult<()>;
}

/// Lists instances of one resource type.
#[async_trait]
pub trait ResourcePlugin: Send + Sync {
    /// Lists everything of `spec`'s type visible in `scope`.
    async fn list(
        &self,
        spec: &Arc<ResourceSpec>,
        scope: &Scope,
    ) -> CleanupResult<Vec<Box<dyn ResourceManager>>>;
}
