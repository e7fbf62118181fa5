//! Spec-driven resource manager shared by most resource types.

use std::sync::Arc;

use async_trait::async_trait;
use cloudbench_core::{CloudResult, ListQuery, RawResource, ServiceClient};
use tracing::debug;

use crate::classifier::is_not_found;
use crate::error::CleanupResult;
use crate::manager::{ResourceManager, ResourcePlugin};
use crate::scope::Scope;
use crate::spec::ResourceSpec;

/// Lifecycle statuses that mean the resource is gone.
const DELETED_STATUSES: &[&str] = &["DELETED", "DELETE_COMPLETE"];

/// Whether a fetched lifecycle status means the resource is gone.
#[must_use]
pub fn is_deleted_status(status: Option<&str>) -> bool {
    status.map_or(false, |status| DELETED_STATUSES.contains(&status))
}

/// Resource instance backed directly by its service client.
pub struct GenericResource {
    spec: Arc<ResourceSpec>,
    scope: Scope,
    client: Arc<dyn ServiceClient>,
    raw: RawResource,
}

impl GenericResource {
    #[must_use]
    pub fn new(
        spec: Arc<ResourceSpec>,
        scope: Scope,
        client: Arc<dyn ServiceClient>,
        raw: RawResource,
    ) -> Self {
        Self {
            spec,
            scope,
            client,
            raw,
        }
    }

    #[must_use]
    pub fn client(&self) -> &Arc<dyn ServiceClient> {
        &self.client
    }

    /// Deletes by an id other than the listed one.
    pub async fn delete_by_id(&self, id: &str) -> CloudResult<()> {
        self.client.delete(&self.spec.resource_type, id).await
    }

    /// Fetches `id` and checks the status `status_of` extracts.
    ///
    /// Not-found means deleted; any other error means not yet deleted.
    pub async fn fetch_is_deleted(
        &self,
        id: &str,
        status_of: fn(&RawResource) -> Option<&str>,
    ) -> bool {
        match self.client.get(&self.spec.resource_type, id).await {
            Ok(current) => is_deleted_status(status_of(&current)),
            Err(error) => {
                let gone = is_not_found(&error);
                if !gone {
                    debug!(
                        resource = %self.spec,
                        resource_id = %id,
                        error = %error,
                        "Status check failed, treating as not deleted"
                    );
                }
                gone
            }
        }
    }
}

#[async_trait]
impl ResourceManager for GenericResource {
    fn spec(&self) -> &ResourceSpec {
        &self.spec
    }

    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn raw(&self) -> &RawResource {
        &self.raw
    }

    async fn is_deleted(&self) -> bool {
        self.fetch_is_deleted(&self.raw.id, |raw| raw.status.as_deref())
            .await
    }

    async fn delete(&self) -> CloudResult<()> {
        self.delete_by_id(&self.raw.id).await
    }
}

/// Query a generic listing sends: admin-required types listed on behalf of
/// a user are narrowed to that user's tenant.
#[must_use]
pub fn scoped_query(spec: &ResourceSpec, scope: &Scope) -> ListQuery {
    let query = ListQuery::default();
    if spec.admin_required && !scope.is_admin() {
        if let Some(tenant) = scope.tenant() {
            return query.with_tenant(tenant);
        }
    }
    query
}

/// Lists `spec`'s type in `scope` with `query`, one [`GenericResource`] per
/// listed payload.
///
/// # Errors
///
/// Propagates client lookup and listing failures.
pub async fn list_resources(
    spec: &Arc<ResourceSpec>,
    scope: &Scope,
    query: &ListQuery,
) -> CleanupResult<Vec<GenericResource>> {
    let client = scope.client_for(spec)?;
    let listed = client.list(&spec.resource_type, query).await?;

    Ok(listed
        .into_iter()
        .map(|raw| GenericResource::new(Arc::clone(spec), scope.clone(), Arc::clone(&client), raw))
        .collect())
}

/// Plugin listing through `client.list(resource_type)` with no extra logic.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericPlugin;

#[async_trait]
impl ResourcePlugin for GenericPlugin {
    async fn list(
        &self,
        spec: &Arc<ResourceSpec>,
        scope: &Scope,
    ) -> CleanupResult<Vec<Box<dyn ResourceManager>>> {
        let listed = list_resources(spec, scope, &scoped_query(spec, scope)).await?;
        Ok(listed
            .into_iter()
            .map(|resource| Box::new(resource) as Box<dyn ResourceManager>)
            .collect())
    }
}
