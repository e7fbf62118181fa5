//! Credential scopes cleanup runs under.

use std::fmt;
use std::sync::Arc;

use cloudbench_core::{Clients, CoreError, CoreResult, ServiceClient, TenantId};

use crate::spec::ResourceSpec;

/// Which credential a scope stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Admin,
    /// Position of the user in the credential set.
    User(usize),
}

/// One credential context: the owning identity plus, when available, the
/// admin identity used for `admin_required` resource types.
#[derive(Clone)]
pub struct Scope {
    kind: ScopeKind,
    owner: Arc<Clients>,
    admin: Option<Arc<Clients>>,
}

impl Scope {
    /// Scope of the admin credential itself.
    #[must_use]
    pub fn admin(admin: Arc<Clients>) -> Self {
        Self {
            kind: ScopeKind::Admin,
            owner: Arc::clone(&admin),
            admin: Some(admin),
        }
    }

    /// Scope of the `index`-th user.
    #[must_use]
    pub fn user(index: usize, user: Arc<Clients>, admin: Option<Arc<Clients>>) -> Self {
        Self {
            kind: ScopeKind::User(index),
            owner: user,
            admin,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.kind == ScopeKind::Admin
    }

    /// Credential that owns resources discovered in this scope.
    #[must_use]
    pub fn owner(&self) -> &Arc<Clients> {
        &self.owner
    }

    /// Tenant of the owning credential.
    #[must_use]
    pub fn tenant(&self) -> Option<TenantId> {
        self.owner.credential().tenant()
    }

    /// Short label for logs and reports (`admin`, `user[1]`).
    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Client for the spec's service: the admin client for `admin_required`
    /// types, the owner's otherwise.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidCredential` when the spec needs an admin and
    /// the scope has none, or the provider error on client creation.
    pub fn client_for(&self, spec: &ResourceSpec) -> CoreResult<Arc<dyn ServiceClient>> {
        let clients = if spec.admin_required {
            self.admin.as_ref().ok_or_else(|| {
                CoreError::invalid_credential(format!(
                    "`{}` requires an admin credential",
                    spec.key()
                ))
            })?
        } else {
            &self.owner
        };
        clients.client_for(&spec.service)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ScopeKind::Admin => f.write_str("admin"),
            ScopeKind::User(index) => write!(f, "user[{}]", index),
        }
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("kind", &self.kind)
            .field("username", &self.owner.credential().username)
            .field("tenant", &self.tenant())
            .field("has_admin", &self.admin.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudbench_core::mock::MockCloud;
    use cloudbench_core::{Credential, Permission};

    fn clients(cloud: &Arc<MockCloud>, name: &str, permission: Permission) -> Arc<Clients> {
        Arc::new(Clients::new(
            Credential::new("http://keystone:5000/v3", name, "pw")
                .with_tenant(name)
                .with_permission(permission),
            cloud.clone(),
        ))
    }

    #[test]
    fn test_admin_required_uses_admin_client() {
        let cloud = Arc::new(MockCloud::new());
        let admin = clients(&cloud, "admin", Permission::Admin);
        let user = clients(&cloud, "demo", Permission::User);
        let spec = ResourceSpec::builder("keystone", "users")
            .admin_required(true)
            .build()
            .unwrap();

        let scope = Scope::user(0, user.clone(), Some(admin));
        assert!(scope.client_for(&spec).is_ok());
        assert_eq!(scope.tenant(), Some(TenantId::new("demo")));
        assert_eq!(scope.label(), "user[0]");

        let scope = Scope::user(0, user, None);
        assert!(matches!(
            scope.client_for(&spec),
            Err(CoreError::InvalidCredential { .. })
        ));
    }

    #[test]
    fn test_admin_scope() {
        let cloud = Arc::new(MockCloud::new());
        let scope = Scope::admin(clients(&cloud, "admin", Permission::Admin));

        assert!(scope.is_admin());
        assert_eq!(scope.label(), "admin");
        let spec = ResourceSpec::builder("nova", "servers").build().unwrap();
        assert_eq!(scope.client_for(&spec).unwrap().service(), "nova");
    }
}
