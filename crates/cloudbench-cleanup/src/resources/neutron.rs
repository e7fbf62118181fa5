//! Load-balancer (LBaaS v1) pools.
//!
//! Pools are shared by every user of a tenant, and a pool listing may return
//! other tenants' pools, so the listing is narrowed to the owner tenant.

use std::sync::Arc;

use async_trait::async_trait;
use cloudbench_core::ListQuery;

use crate::error::CleanupResult;
use crate::generic::list_resources;
use crate::manager::{ResourceManager, ResourcePlugin};
use crate::scope::Scope;
use crate::spec::ResourceSpec;

#[derive(Debug, Clone, Copy, Default)]
pub struct PoolPlugin;

#[async_trait]
impl ResourcePlugin for PoolPlugin {
    async fn list(
        &self,
        spec: &Arc<ResourceSpec>,
        scope: &Scope,
    ) -> CleanupResult<Vec<Box<dyn ResourceManager>>> {
        let Some(tenant) = scope.tenant() else {
            return Ok(Vec::new());
        };

        let query = ListQuery::default().with_tenant(tenant.clone());
        let listed = list_resources(spec, scope, &query).await?;

        Ok(listed
            .into_iter()
            .filter(|pool| pool.raw().tenant_id.as_deref() == Some(tenant.as_str()))
            .map(|pool| Box::new(pool) as Box<dyn ResourceManager>)
            .collect())
    }
}
