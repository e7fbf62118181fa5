//! Credentials produced by the deployment layer.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::client::{ClientProvider, ServiceClient};
use crate::error::{CoreError, CoreResult};
use crate::ids::TenantId;

/// Privilege level of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Cloud administrator; may see and manage every tenant.
    Admin,
    /// Regular tenant user.
    User,
}

impl Permission {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

/// Which service catalog endpoint to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointType {
    Public,
    Internal,
    Admin,
}

impl Default for EndpointType {
    fn default() -> Self {
        Self::Public
    }
}

/// Endpoint and authentication material for one identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Identity service URL (e.g. `http://localhost:5000/v3/`).
    pub auth_url: String,
    pub username: String,
    pub password: String,
    /// Tenant (project) name the credential is scoped to.
    pub tenant_name: Option<String>,
    /// Tenant id, when already resolved by the deployment layer.
    pub tenant_id: Option<TenantId>,
    pub permission: Permission,
    pub region_name: Option<String>,
    pub endpoint_type: EndpointType,
    pub domain_name: Option<String>,
    pub user_domain_name: String,
    pub project_domain_name: String,
}

impl Credential {
    /// Domain used when a v3 identity service gets no explicit domain.
    pub const DEFAULT_DOMAIN: &'static str = "Default";

    /// Creates a user-level credential with default domains.
    #[must_use]
    pub fn new(
        auth_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            auth_url: auth_url.into(),
            username: username.into(),
            password: password.into(),
            tenant_name: None,
            tenant_id: None,
            permission: Permission::User,
            region_name: None,
            endpoint_type: EndpointType::default(),
            domain_name: None,
            user_domain_name: Self::DEFAULT_DOMAIN.to_string(),
            project_domain_name: Self::DEFAULT_DOMAIN.to_string(),
        }
    }

    #[must_use]
    pub fn with_tenant(mut self, tenant_name: impl Into<String>) -> Self {
        self.tenant_name = Some(tenant_name.into());
        self
    }

    #[must_use]
    pub fn with_tenant_id(mut self, tenant_id: impl Into<TenantId>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    #[must_use]
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    #[must_use]
    pub fn with_region(mut self, region_name: impl Into<String>) -> Self {
        self.region_name = Some(region_name.into());
        self
    }

    #[must_use]
    pub fn with_endpoint_type(mut self, endpoint_type: EndpointType) -> Self {
        self.endpoint_type = endpoint_type;
        self
    }

    /// Tenant identity of this credential: the resolved id when known,
    /// otherwise the tenant name.
    #[must_use]
    pub fn tenant(&self) -> Option<TenantId> {
        self.tenant_id
            .clone()
            .or_else(|| self.tenant_name.as_deref().map(TenantId::from))
    }

    /// Checks the fields every cloud SDK needs to authenticate.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidCredential` for a non-HTTP auth URL or an
    /// empty username.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.auth_url.starts_with("http://") || self.auth_url.starts_with("https://")) {
            return Err(CoreError::invalid_credential(format!(
                "auth_url `{}` must be an http(s) URL",
                self.auth_url
            )));
        }
        if self.username.trim().is_empty() {
            return Err(CoreError::invalid_credential("username must not be empty"));
        }
        Ok(())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("auth_url", &self.auth_url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("tenant_name", &self.tenant_name)
            .field("tenant_id", &self.tenant_id)
            .field("permission", &self.permission)
            .field("region_name", &self.region_name)
            .field("endpoint_type", &self.endpoint_type)
            .finish_non_exhaustive()
    }
}

/// A credential together with lazily created, cached service clients.
pub struct Clients {
    credential: Credential,
    provider: Arc<dyn ClientProvider>,
    cache: RwLock<HashMap<String, Arc<dyn ServiceClient>>>,
}

impl Clients {
    #[must_use]
    pub fn new(credential: Credential, provider: Arc<dyn ClientProvider>) -> Self {
        Self {
            credential,
            provider,
            cache: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Returns the client for `service`, creating it on first use.
    ///
    /// # Errors
    ///
    /// Propagates the provider error when the client cannot be created.
    pub fn client_for(&self, service: &str) -> CoreResult<Arc<dyn ServiceClient>> {
        if let Some(client) = self.cache.read().get(service) {
            return Ok(client.clone());
        }

        let client = self.provider.create_client(&self.credential, service)?;
        let mut cache = self.cache.write();
        // Another caller may have raced us; keep whichever landed first.
        let entry = cache.entry(service.to_string()).or_insert(client);
        Ok(Arc::clone(entry))
    }
}

impl fmt::Debug for Clients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clients")
            .field("credential", &self.credential)
            .field("cached_services", &self.cache.read().len())
            .finish()
    }
}

/// Credentials handed over by the deployment layer: one optional admin and
/// any number of tenant users.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    admin: Option<Arc<Clients>>,
    users: Vec<Arc<Clients>>,
}

impl CredentialSet {
    /// Builds a credential set, checking its shape.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidCredential` when the admin credential lacks
    /// admin permission, a user has no tenant, or any credential fails
    /// [`Credential::validate`].
    pub fn new(admin: Option<Clients>, users: Vec<Clients>) -> CoreResult<Self> {
        if let Some(admin) = &admin {
            admin.credential().validate()?;
            if admin.credential().permission != Permission::Admin {
                return Err(CoreError::invalid_credential(format!(
                    "admin credential `{}` does not carry admin permission",
                    admin.credential().username
                )));
            }
        }

        for user in &users {
            user.credential().validate()?;
            if user.credential().tenant().is_none() {
                return Err(CoreError::invalid_credential(format!(
                    "user `{}` is not scoped to a tenant",
                    user.credential().username
                )));
            }
        }

        Ok(Self {
            admin: admin.map(Arc::new),
            users: users.into_iter().map(Arc::new).collect(),
        })
    }

    #[must_use]
    pub fn admin(&self) -> Option<&Arc<Clients>> {
        self.admin.as_ref()
    }

    #[must_use]
    pub fn users(&self) -> &[Arc<Clients>] {
        &self.users
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.admin.is_none() && self.users.is_empty()
    }
}
