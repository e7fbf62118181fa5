//! Engine for a cloud that already exists.
//!
//! Nothing is provisioned: the config lists the endpoint and the accounts to
//! use. Two flavors are accepted:
//!
//! ```json
//! {
//!     "type": "ExistingCloud",
//!     "auth_url": "http://localhost:5000/v2.0/",
//!     "region_name": "RegionOne",
//!     "endpoint_type": "public",
//!     "admin": {"username": "admin", "password": "secret", "tenant_name": "admin"},
//!     "users": [{"username": "demo", "password": "secret", "tenant_name": "demo"}]
//! }
//! ```
//!
//! and `"type": "ExistingCloudNonAdmin"`, which takes `users` only. Users may
//! use identity v3 fields instead of `tenant_name`: `project_name`,
//! `user_domain_name` and `project_domain_name` (both domains default to
//! `Default`).

use std::sync::Arc;

use async_trait::async_trait;
use cloudbench_core::{
    ClientProvider, Clients, Credential, CredentialSet, EndpointType, Permission,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::DeployEngine;
use crate::error::{DeployError, DeployResult};

/// One account of an existing cloud.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub password: String,
    /// Identity v2 tenant.
    #[serde(default)]
    pub tenant_name: Option<String>,
    /// Identity v3 project; wins over `tenant_name`.
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub domain_name: Option<String>,
    #[serde(default)]
    pub user_domain_name: Option<String>,
    #[serde(default)]
    pub project_domain_name: Option<String>,
}

impl UserConfig {
    fn project(&self) -> Option<&str> {
        self.project_name
            .as_deref()
            .or(self.tenant_name.as_deref())
    }
}

/// Deployment config of [`ExistingCloud`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingCloudConfig {
    #[serde(rename = "type")]
    pub engine_type: String,
    pub auth_url: String,
    #[serde(default)]
    pub region_name: Option<String>,
    #[serde(default)]
    pub endpoint_type: EndpointType,
    #[serde(default)]
    pub admin: Option<UserConfig>,
    #[serde(default)]
    pub users: Vec<UserConfig>,
}

impl ExistingCloudConfig {
    /// Checks engine type, endpoint and accounts.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::InvalidConfig` describing the first problem.
    pub fn validate(&self) -> DeployResult<()> {
        let non_admin = match self.engine_type.as_str() {
            ExistingCloud::NAME => false,
            ExistingCloud::NON_ADMIN_NAME => true,
            other => {
                return Err(DeployError::invalid_config(format!(
                    "unsupported engine type `{}`",
                    other
                )))
            }
        };

        if self.endpoint_type == EndpointType::Admin {
            return Err(DeployError::invalid_config(
                "endpoint_type must be `public` or `internal`",
            ));
        }

        if non_admin && self.admin.is_some() {
            return Err(DeployError::invalid_config(format!(
                "{} does not take an admin account",
                ExistingCloud::NON_ADMIN_NAME
            )));
        }

        if non_admin && self.users.is_empty() {
            return Err(DeployError::invalid_config(format!(
                "{} requires at least one user",
                ExistingCloud::NON_ADMIN_NAME
            )));
        }

        if self.admin.is_none() && self.users.is_empty() {
            return Err(DeployError::invalid_config(
                "at least an admin or one user is required",
            ));
        }

        if let Some(user) = self.users.iter().find(|user| user.project().is_none()) {
            return Err(DeployError::invalid_config(format!(
                "user `{}` needs `tenant_name` or `project_name`",
                user.username
            )));
        }

        Ok(())
    }

    fn credential(&self, user: &UserConfig, permission: Permission) -> Credential {
        let mut credential = Credential::new(&self.auth_url, &user.username, &user.password)
            .with_permission(permission)
            .with_endpoint_type(self.endpoint_type);

        if let Some(project) = user.project() {
            credential = credential.with_tenant(project);
        }
        if let Some(region) = &self.region_name {
            credential = credential.with_region(region);
        }
        credential.domain_name = user.domain_name.clone();
        if let Some(domain) = &user.user_domain_name {
            credential.user_domain_name = domain.clone();
        }
        if let Some(domain) = &user.project_domain_name {
            credential.project_domain_name = domain.clone();
        }
        credential
    }
}

/// Uses an existing cloud as is.
#[derive(Debug, Clone)]
pub struct ExistingCloud {
    config: ExistingCloudConfig,
}

impl ExistingCloud {
    pub const NAME: &'static str = "ExistingCloud";
    pub const NON_ADMIN_NAME: &'static str = "ExistingCloudNonAdmin";

    /// Creates the engine from a parsed config.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::InvalidConfig` if the config does not validate.
    pub fn new(config: ExistingCloudConfig) -> DeployResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Parses and validates a JSON deployment config.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Parse` for malformed JSON and
    /// `DeployError::InvalidConfig` if validation fails.
    pub fn from_json(json: &str) -> DeployResult<Self> {
        Self::new(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn config(&self) -> &ExistingCloudConfig {
        &self.config
    }
}

#[async_trait]
impl DeployEngine for ExistingCloud {
    fn name(&self) -> &str {
        &self.config.engine_type
    }

    async fn deploy(&self, provider: Arc<dyn ClientProvider>) -> DeployResult<CredentialSet> {
        let admin = self.config.admin.as_ref().map(|admin| {
            Clients::new(
                self.config.credential(admin, Permission::Admin),
                Arc::clone(&provider),
            )
        });

        let users = self
            .config
            .users
            .iter()
            .map(|user| {
                Clients::new(
                    self.config.credential(user, Permission::User),
                    Arc::clone(&provider),
                )
            })
            .collect::<Vec<_>>();

        info!(
            engine = %self.config.engine_type,
            auth_url = %self.config.auth_url,
            admin = admin.is_some(),
            users = users.len(),
            "Using existing cloud"
        );

        Ok(CredentialSet::new(admin, users)?)
    }

    async fn cleanup(&self) -> DeployResult<()> {
        Ok(())
    }
}
