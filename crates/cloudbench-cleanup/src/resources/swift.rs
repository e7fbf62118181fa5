//! Object storage containers and objects.
//!
//! Objects can only be listed per container, so the object plugin lists the
//! containers first. Object ids are `container/object` paths.

use std::sync::Arc;

use async_trait::async_trait;
use cloudbench_core::ListQuery;

use crate::error::CleanupResult;
use crate::generic::list_resources;
use crate::manager::{ResourceManager, ResourcePlugin};
use crate::scope::Scope;
use crate::spec::ResourceSpec;

/// Resource type holding the containers objects are nested in.
pub const CONTAINERS: &str = "containers";

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectPlugin;

#[async_trait]
impl ResourcePlugin for ObjectPlugin {
    async fn list(
        &self,
        spec: &Arc<ResourceSpec>,
        scope: &Scope,
    ) -> CleanupResult<Vec<Box<dyn ResourceManager>>> {
        let client = scope.client_for(spec)?;
        let containers = client.list(CONTAINERS, &ListQuery::default()).await?;

        let mut objects: Vec<Box<dyn ResourceManager>> = Vec::new();
        for container in containers {
            let query = ListQuery::default().with_parent(container.id);
            for object in list_resources(spec, scope, &query).await? {
                objects.push(Box::new(object));
            }
        }
        Ok(objects)
    }
}
