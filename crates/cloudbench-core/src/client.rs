//! Service-client capability interface.
//!
//! Every cloud service (compute, network, object storage, ...) is reached
//! through a [`ServiceClient`] obtained from a credential via
//! [`crate::Clients::client_for`]. Resource types within a service are
//! addressed by name (`"servers"`, `"pools"`, `"objects"`), so a single client
//! serves every resource manager of its service.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::credential::Credential;
use crate::error::CoreResult;
use crate::ids::TenantId;

/// Error returned by a remote service call.
///
/// Variants carry the typed status/code so callers can classify faults
/// (for instance "not found") without inspecting message text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloudError {
    /// The service reported that the addressed object does not exist.
    #[error("{resource} `{id}` not found")]
    NotFound {
        /// Resource type name.
        resource: String,
        /// Identifier that was looked up.
        id: String,
    },

    /// Non-success HTTP status from the service endpoint.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// Service-specific fault with a symbolic code (e.g. `"itemNotFound"`).
    #[error("API error {code}: {message}")]
    Api {
        /// Fault code as reported by the service.
        code: String,
        /// Fault message.
        message: String,
    },

    /// Service temporarily unable to handle the request.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Network or connection level failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl CloudError {
    /// Creates a `NotFound` variant.
    #[must_use]
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Creates an `Http` variant.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates an `Api` variant.
    #[must_use]
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Result alias for remote service calls.
pub type CloudResult<T> = Result<T, CloudError>;

/// Resource payload as returned by a service listing or fetch.
///
/// `id` is always present; everything else is best-effort. Fields the
/// generic code does not understand stay in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResource {
    /// Service-assigned identifier.
    pub id: String,
    /// Display name, when the service exposes one as a string.
    #[serde(default)]
    pub name: Option<String>,
    /// Lifecycle status (`ACTIVE`, `DELETED`, ...).
    #[serde(default)]
    pub status: Option<String>,
    /// Owning tenant, when the service reports it.
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Remaining service-specific fields.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl RawResource {
    /// Creates a payload carrying only an identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            status: None,
            tenant_id: None,
            attributes: Map::new(),
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    #[must_use]
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns a service-specific attribute as a string, if it is one.
    #[must_use]
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

/// Filters applied to a listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Parent container for nested resources (e.g. the bucket of an object).
    pub parent: Option<String>,
    /// Restrict the listing to one tenant (meaningful for admin clients).
    pub tenant_id: Option<TenantId>,
}

impl ListQuery {
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }
}

/// Typed handle onto one cloud service, bound to one credential.
#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// Logical service name this client talks to.
    fn service(&self) -> &str;

    /// Lists resources of `resource_type` visible to the bound credential.
    async fn list(&self, resource_type: &str, query: &ListQuery) -> CloudResult<Vec<RawResource>>;

    /// Fetches one resource by id.
    ///
    /// Missing resources are reported as an error (`NotFound`, HTTP 404, or
    /// a service-specific not-found code), never as `Ok`.
    async fn get(&self, resource_type: &str, id: &str) -> CloudResult<RawResource>;

    /// Requests deletion of one resource. Deletion may complete asynchronously.
    async fn delete(&self, resource_type: &str, id: &str) -> CloudResult<()>;
}

/// Builds service clients for a credential.
///
/// Implemented by the SDK glue of a concrete cloud; tests use
/// [`crate::mock::MockCloud`].
pub trait ClientProvider: Send + Sync {
    /// Creates a client for `service` authenticated as `credential`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownService` when the service is not deployed or
    /// not reachable with this credential.
    fn create_client(
        &self,
        credential: &Credential,
        service: &str,
    ) -> CoreResult<Arc<dyn ServiceClient>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_resource_deserializes_with_defaults() {
        let raw: RawResource = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(raw.id, "abc");
        assert!(raw.name.is_none());
        assert!(raw.attributes.is_empty());
    }

    #[test]
    fn test_attribute_str_ignores_non_strings() {
        let raw = RawResource::new("abc")
            .with_attribute("stack_status", "DELETE_COMPLETE")
            .with_attribute("size", 3);

        assert_eq!(raw.attribute_str("stack_status"), Some("DELETE_COMPLETE"));
        assert_eq!(raw.attribute_str("size"), None);
        assert_eq!(raw.attribute_str("missing"), None);
    }

    #[test]
    fn test_cloud_error_display() {
        assert_eq!(
            CloudError::http(404, "Not Found").to_string(),
            "HTTP 404: Not Found"
        );
        assert_eq!(
            CloudError::not_found("servers", "s1").to_string(),
            "servers `s1` not found"
        );
    }
}
