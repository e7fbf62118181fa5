//! In-memory cloud for testing
//!
//! Simulates any number of services with tenant-aware visibility and
//! scripted failures, so cleanup retry, timeout and isolation behavior can be
//! exercised without a real cloud.
//!
//! # Features
//!
//! - **Tenant Visibility**: user clients only see their own tenant's resources
//! - **Deterministic Failures**: per-resource delete failure queues and
//!   per-type list failure queues
//! - **Status Scripts**: per-resource answers for `get`, consumed in order
//! - **Call History**: every call recorded for assertions
//! - **Concurrency Tracking**: peak number of in-flight deletes
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use cloudbench_core::mock::{MockCloud, MockFailure};
//! use cloudbench_core::{Clients, Credential, RawResource};
//!
//! # async fn example() -> cloudbench_core::CoreResult<()> {
//! let cloud = Arc::new(MockCloud::new());
//! cloud.add_resource("nova", "servers", RawResource::new("s1").with_tenant("t1"));
//! cloud.fail_deletes("s1", vec![MockFailure::Transient("503"), MockFailure::Ok]);
//!
//! let clients = Clients::new(
//!     Credential::new("http://keystone:5000/v3", "demo", "pw").with_tenant_id("t1"),
//!     cloud.clone(),
//! );
//! let nova = clients.client_for("nova")?;
//! assert!(nova.delete("servers", "s1").await.is_err());
//! assert!(nova.delete("servers", "s1").await.is_ok());
//! assert_eq!(cloud.delete_calls("s1"), 2);
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::time::Instant;

use crate::client::{ClientProvider, CloudError, CloudResult, ListQuery, RawResource, ServiceClient};
use crate::credential::{Credential, Permission};
use crate::error::{CoreError, CoreResult};
use crate::ids::TenantId;

/// Scripted outcome of one mock call.
#[derive(Debug, Clone)]
pub enum MockFailure {
    /// Service temporarily unavailable (`CloudError::Unavailable`).
    Transient(&'static str),

    /// HTTP error with the given status.
    Http(u16),

    /// Service-specific fault code.
    Api(&'static str),

    /// The service claims the resource does not exist.
    NotFound,

    /// Success (no error).
    Ok,
}

impl MockFailure {
    fn to_error(&self, resource_type: &str, id: &str) -> Option<CloudError> {
        match self {
            MockFailure::Transient(msg) => Some(CloudError::Unavailable((*msg).to_string())),
            MockFailure::Http(status) => Some(CloudError::http(*status, "mock failure")),
            MockFailure::Api(code) => Some(CloudError::api(*code, "mock failure")),
            MockFailure::NotFound => Some(CloudError::not_found(resource_type, id)),
            MockFailure::Ok => None,
        }
    }
}

/// Scripted answer to a `get` call.
#[derive(Debug, Clone)]
pub enum MockStatus {
    /// The resource exists with this payload.
    Present(RawResource),

    /// The resource is gone.
    Gone,

    /// The call fails.
    Fail(MockFailure),
}

/// Mock call history entry.
#[derive(Debug, Clone)]
pub struct CallHistoryEntry {
    /// Operation type: "list", "get", "delete".
    pub operation: String,

    pub service: String,

    pub resource_type: String,

    /// Resource id, or the listing parent (empty when none).
    pub key: String,

    /// Tenant of the calling credential.
    pub tenant: Option<TenantId>,

    /// Whether the call succeeded.
    pub success: bool,

    pub timestamp: Instant,
}

#[derive(Default)]
struct MockState {
    /// Resources per (service, resource type), in insertion order.
    resources: RwLock<HashMap<(String, String), Vec<RawResource>>>,
    delete_failures: RwLock<HashMap<String, VecDeque<MockFailure>>>,
    list_failures: RwLock<HashMap<(String, String), VecDeque<MockFailure>>>,
    status_scripts: RwLock<HashMap<String, VecDeque<MockStatus>>>,
    /// Ids whose deletion is accepted but never completes.
    stuck: RwLock<HashSet<String>>,
    disabled_services: RwLock<HashSet<String>>,
    call_history: RwLock<Vec<CallHistoryEntry>>,
    in_flight_deletes: AtomicUsize,
    max_in_flight_deletes: AtomicUsize,
}

/// In-memory cloud implementing [`ClientProvider`].
pub struct MockCloud {
    state: Arc<MockState>,
    latency: Duration,
}

impl MockCloud {
    /// Creates an empty cloud with no latency.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(MockState::default()),
            latency: Duration::ZERO,
        }
    }

    /// Adds simulated latency to every call.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Stores a resource.
    pub fn add_resource(&self, service: &str, resource_type: &str, resource: RawResource) {
        self.state
            .resources
            .write()
            .entry((service.to_string(), resource_type.to_string()))
            .or_default()
            .push(resource);
    }

    /// Queues outcomes for successive deletes of `id`. Once the queue is
    /// empty, deletes succeed.
    pub fn fail_deletes(&self, id: &str, pattern: Vec<MockFailure>) {
        self.state
            .delete_failures
            .write()
            .insert(id.to_string(), pattern.into());
    }

    /// Queues outcomes for successive listings of one resource type.
    pub fn fail_lists(&self, service: &str, resource_type: &str, pattern: Vec<MockFailure>) {
        self.state
            .list_failures
            .write()
            .insert((service.to_string(), resource_type.to_string()), pattern.into());
    }

    /// Queues answers for successive `get` calls on `id`. Once the script is
    /// exhausted, `get` reflects the stored state.
    pub fn script_statuses(&self, id: &str, script: Vec<MockStatus>) {
        self.state
            .status_scripts
            .write()
            .insert(id.to_string(), script.into());
    }

    /// Makes deletes of `id` succeed without removing the resource.
    pub fn keep_after_delete(&self, id: &str) {
        self.state.stuck.write().insert(id.to_string());
    }

    /// Makes client creation for `service` fail.
    pub fn disable_service(&self, service: &str) {
        self.state.disabled_services.write().insert(service.to_string());
    }

    /// Whether a resource is still stored.
    #[must_use]
    pub fn contains(&self, service: &str, resource_type: &str, id: &str) -> bool {
        self.state
            .resources
            .read()
            .get(&(service.to_string(), resource_type.to_string()))
            .map_or(false, |items| items.iter().any(|r| r.id == id))
    }

    /// Number of stored resources of one type.
    #[must_use]
    pub fn resource_count(&self, service: &str, resource_type: &str) -> usize {
        self.state
            .resources
            .read()
            .get(&(service.to_string(), resource_type.to_string()))
            .map_or(0, Vec::len)
    }

    /// Get call history for assertions.
    #[must_use]
    pub fn call_history(&self) -> Vec<CallHistoryEntry> {
        self.state.call_history.read().clone()
    }

    /// Number of delete calls issued for `id`.
    #[must_use]
    pub fn delete_calls(&self, id: &str) -> usize {
        self.count_calls("delete", id)
    }

    /// Number of get calls issued for `id`.
    #[must_use]
    pub fn get_calls(&self, id: &str) -> usize {
        self.count_calls("get", id)
    }

    /// Number of listings of one resource type.
    #[must_use]
    pub fn list_calls(&self, service: &str, resource_type: &str) -> usize {
        self.state
            .call_history
            .read()
            .iter()
            .filter(|entry| {
                entry.operation == "list"
                    && entry.service == service
                    && entry.resource_type == resource_type
            })
            .count()
    }

    /// Peak number of deletes in flight at the same time.
    #[must_use]
    pub fn max_concurrent_deletes(&self) -> usize {
        self.state.max_in_flight_deletes.load(Ordering::SeqCst)
    }

    fn count_calls(&self, operation: &str, id: &str) -> usize {
        self.state
            .call_history
            .read()
            .iter()
            .filter(|entry| entry.operation == operation && entry.key == id)
            .count()
    }
}

impl Default for MockCloud {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientProvider for MockCloud {
    fn create_client(
        &self,
        credential: &Credential,
        service: &str,
    ) -> CoreResult<Arc<dyn ServiceClient>> {
        if self.state.disabled_services.read().contains(service) {
            return Err(CoreError::unknown_service(service));
        }

        Ok(Arc::new(MockServiceClient {
            service: service.to_string(),
            tenant: credential.tenant(),
            admin: credential.permission == Permission::Admin,
            state: Arc::clone(&self.state),
            latency: self.latency,
        }))
    }
}

/// Client for one service, bound to one credential's visibility.
struct MockServiceClient {
    service: String,
    tenant: Option<TenantId>,
    admin: bool,
    state: Arc<MockState>,
    latency: Duration,
}

impl MockServiceClient {
    fn visible(&self, resource: &RawResource) -> bool {
        if self.admin {
            return true;
        }
        match (&resource.tenant_id, &self.tenant) {
            (None, _) => true,
            (Some(owner), Some(tenant)) => owner == tenant.as_str(),
            (Some(_), None) => false,
        }
    }

    fn lookup(&self, resource_type: &str, id: &str) -> Option<RawResource> {
        self.state
            .resources
            .read()
            .get(&(self.service.clone(), resource_type.to_string()))
            .and_then(|items| items.iter().find(|r| r.id == id).cloned())
            .filter(|r| self.visible(r))
    }

    fn record_call(&self, operation: &str, resource_type: &str, key: &str, success: bool) {
        self.state.call_history.write().push(CallHistoryEntry {
            operation: operation.to_string(),
            service: self.service.clone(),
            resource_type: resource_type.to_string(),
            key: key.to_string(),
            tenant: self.tenant.clone(),
            success,
            timestamp: Instant::now(),
        });
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl ServiceClient for MockServiceClient {
    fn service(&self) -> &str {
        &self.service
    }

    async fn list(&self, resource_type: &str, query: &ListQuery) -> CloudResult<Vec<RawResource>> {
        self.simulate_latency().await;
        let parent = query.parent.clone().unwrap_or_default();

        let failure = self
            .state
            .list_failures
            .write()
            .get_mut(&(self.service.clone(), resource_type.to_string()))
            .and_then(VecDeque::pop_front);
        if let Some(error) = failure.and_then(|f| f.to_error(resource_type, &parent)) {
            self.record_call("list", resource_type, &parent, false);
            return Err(error);
        }

        let items: Vec<RawResource> = self
            .state
            .resources
            .read()
            .get(&(self.service.clone(), resource_type.to_string()))
            .map(|items| {
                items
                    .iter()
                    .filter(|r| self.visible(r))
                    .filter(|r| match &query.tenant_id {
                        Some(tenant) => r.tenant_id.as_deref() == Some(tenant.as_str()),
                        None => true,
                    })
                    .filter(|r| match &query.parent {
                        Some(parent) => r.attribute_str("container") == Some(parent.as_str()),
                        None => true,
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        self.record_call("list", resource_type, &parent, true);
        Ok(items)
    }

    async fn get(&self, resource_type: &str, id: &str) -> CloudResult<RawResource> {
        self.simulate_latency().await;

        let scripted = self
            .state
            .status_scripts
            .write()
            .get_mut(id)
            .and_then(VecDeque::pop_front);

        let result = match scripted {
            Some(MockStatus::Present(raw)) => Ok(raw),
            Some(MockStatus::Gone) => Err(CloudError::not_found(resource_type, id)),
            Some(MockStatus::Fail(failure)) => match failure.to_error(resource_type, id) {
                Some(error) => Err(error),
                None => self
                    .lookup(resource_type, id)
                    .ok_or_else(|| CloudError::not_found(resource_type, id)),
            },
            None => self
                .lookup(resource_type, id)
                .ok_or_else(|| CloudError::not_found(resource_type, id)),
        };

        self.record_call("get", resource_type, id, result.is_ok());
        result
    }

    async fn delete(&self, resource_type: &str, id: &str) -> CloudResult<()> {
        let in_flight = self.state.in_flight_deletes.fetch_add(1, Ordering::SeqCst) + 1;
        self.state
            .max_in_flight_deletes
            .fetch_max(in_flight, Ordering::SeqCst);

        self.simulate_latency().await;
        let result = self.delete_inner(resource_type, id);

        self.state.in_flight_deletes.fetch_sub(1, Ordering::SeqCst);
        self.record_call("delete", resource_type, id, result.is_ok());
        result
    }
}

impl MockServiceClient {
    fn delete_inner(&self, resource_type: &str, id: &str) -> CloudResult<()> {
        let failure = self
            .state
            .delete_failures
            .write()
            .get_mut(id)
            .and_then(VecDeque::pop_front);
        if let Some(error) = failure.and_then(|f| f.to_error(resource_type, id)) {
            return Err(error);
        }

        if self.lookup(resource_type, id).is_none() {
            return Err(CloudError::not_found(resource_type, id));
        }

        if !self.state.stuck.read().contains(id) {
            if let Some(items) = self
                .state
                .resources
                .write()
                .get_mut(&(self.service.clone(), resource_type.to_string()))
            {
                items.retain(|r| r.id != id);
            }
        }
        Ok(())
    }
}
