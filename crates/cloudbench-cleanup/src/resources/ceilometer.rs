//! Telemetry alarms, identified by `alarm_id`.

use std::sync::Arc;

use async_trait::async_trait;
use cloudbench_core::{CloudResult, RawResource, ResourceId};

use crate::error::CleanupResult;
use crate::generic::{list_resources, scoped_query, GenericResource};
use crate::manager::{ResourceManager, ResourcePlugin};
use crate::scope::Scope;
use crate::spec::ResourceSpec;

pub struct Alarm(GenericResource);

impl Alarm {
    fn alarm_id(&self) -> &str {
        let raw = self.0.raw();
        raw.attribute_str("alarm_id").unwrap_or(&raw.id)
    }
}

#[async_trait]
impl ResourceManager for Alarm {
    fn spec(&self) -> &ResourceSpec {
        self.0.spec()
    }

    fn scope(&self) -> &Scope {
        self.0.scope()
    }

    fn raw(&self) -> &RawResource {
        self.0.raw()
    }

    fn identity(&self) -> ResourceId {
        ResourceId::new(self.alarm_id())
    }

    async fn is_deleted(&self) -> bool {
        self.0
            .fetch_is_deleted(self.alarm_id(), |raw| raw.status.as_deref())
            .await
    }

    async fn delete(&self) -> CloudResult<()> {
        self.0.delete_by_id(self.alarm_id()).await
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlarmPlugin;

#[async_trait]
impl ResourcePlugin for AlarmPlugin {
    async fn list(
        &self,
        spec: &Arc<ResourceSpec>,
        scope: &Scope,
    ) -> CleanupResult<Vec<Box<dyn ResourceManager>>> {
        let listed = list_resources(spec, scope, &scoped_query(spec, scope)).await?;
        Ok(listed
            .into_iter()
            .map(|resource| Box::new(Alarm(resource)) as Box<dyn ResourceManager>)
            .collect())
    }
}
