//! Orchestration stacks.
//!
//! Stacks report their lifecycle in `stack_status` rather than `status`.

use std::sync::Arc;

use async_trait::async_trait;
use cloudbench_core::{CloudResult, RawResource};

use crate::error::CleanupResult;
use crate::generic::{list_resources, scoped_query, GenericResource};
use crate::manager::{ResourceManager, ResourcePlugin};
use crate::scope::Scope;
use crate::spec::ResourceSpec;

fn stack_status(raw: &RawResource) -> Option<&str> {
    raw.attribute_str("stack_status").or(raw.status.as_deref())
}

pub struct Stack(GenericResource);

#[async_trait]
impl ResourceManager for Stack {
    fn spec(&self) -> &ResourceSpec {
        self.0.spec()
    }

    fn scope(&self) -> &Scope {
        self.0.scope()
    }

    fn raw(&self) -> &RawResource {
        self.0.raw()
    }

    async fn is_deleted(&self) -> bool {
        self.0.fetch_is_deleted(&self.0.raw().id, stack_status).await
    }

    async fn delete(&self) -> CloudResult<()> {
        self.0.delete().await
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StackPlugin;

#[async_trait]
impl ResourcePlugin for StackPlugin {
    async fn list(
        &self,
        spec: &Arc<ResourceSpec>,
        scope: &Scope,
    ) -> CleanupResult<Vec<Box<dyn ResourceManager>>> {
        let listed = list_resources(spec, scope, &scoped_query(spec, scope)).await?;
        Ok(listed
            .into_iter()
            .map(|resource| Box::new(Stack(resource)) as Box<dyn ResourceManager>)
            .collect())
    }
}
