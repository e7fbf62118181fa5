//! Static per-resource-type cleanup configuration.

use std::fmt;
use std::time::Duration;

use cloudbench_core::ResourceDefaults;
use tokio::sync::Semaphore;

use crate::error::{CleanupError, CleanupResult};

/// Immutable cleanup parameters for one `(service, resource_type)` pair.
///
/// Built through [`ResourceSpec::builder`], which validates ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    /// Logical service name, equal to the client name (`"nova"`, `"swift"`).
    pub service: String,
    /// Resource type within the service client (`"servers"`, `"objects"`).
    pub resource_type: String,
    /// Deletion priority; lower runs first. Ties keep registration order.
    pub order: i32,
    /// List and delete through the admin credential.
    pub admin_required: bool,
    /// Only clean up in the admin scope, never per user.
    pub perform_for_admin_only: bool,
    /// Delete once per tenant rather than once per user.
    pub tenant_resource: bool,
    /// Delete calls allowed for a single resource (at least 1).
    pub max_attempts: u32,
    /// How long to wait for deletion to be confirmed.
    pub timeout: Duration,
    /// Spacing between status polls and between delete attempts.
    pub interval: Duration,
    /// Resources of this type deleted in parallel.
    pub concurrency: usize,
}

impl ResourceSpec {
    /// Starts a spec with the built-in defaults.
    #[must_use]
    pub fn builder(service: impl Into<String>, resource_type: impl Into<String>) -> ResourceSpecBuilder {
        ResourceSpecBuilder::new(service.into(), resource_type.into())
    }

    /// `service.resource_type`, the form selectors and logs use.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}.{}", self.service, self.resource_type)
    }
}

impl fmt::Display for ResourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.service, self.resource_type)
    }
}

/// Builder for [`ResourceSpec`].
#[derive(Debug, Clone)]
pub struct ResourceSpecBuilder {
    spec: ResourceSpec,
}

impl ResourceSpecBuilder {
    fn new(service: String, resource_type: String) -> Self {
        let defaults = ResourceDefaults::default();
        Self {
            spec: ResourceSpec {
                service,
                resource_type,
                order: 0,
                admin_required: false,
                perform_for_admin_only: false,
                tenant_resource: false,
                max_attempts: defaults.max_attempts,
                timeout: defaults.timeout(),
                interval: defaults.interval(),
                concurrency: defaults.concurrency,
            },
        }
    }

    /// Takes retry, timeout, interval and concurrency from configuration.
    #[must_use]
    pub fn defaults(mut self, defaults: &ResourceDefaults) -> Self {
        self.spec.max_attempts = defaults.max_attempts;
        self.spec.timeout = defaults.timeout();
        self.spec.interval = defaults.interval();
        self.spec.concurrency = defaults.concurrency;
        self
    }

    #[must_use]
    pub fn order(mut self, order: i32) -> Self {
        self.spec.order = order;
        self
    }

    #[must_use]
    pub fn admin_required(mut self, admin_required: bool) -> Self {
        self.spec.admin_required = admin_required;
        self
    }

    #[must_use]
    pub fn admin_only(mut self, perform_for_admin_only: bool) -> Self {
        self.spec.perform_for_admin_only = perform_for_admin_only;
        self
    }

    #[must_use]
    pub fn tenant_resource(mut self, tenant_resource: bool) -> Self {
        self.spec.tenant_resource = tenant_resource;
        self
    }

    #[must_use]
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.spec.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.spec.timeout = timeout;
        self
    }

    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.spec.interval = interval;
        self
    }

    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.spec.concurrency = concurrency;
        self
    }

    /// Validates and returns the spec.
    ///
    /// # Errors
    ///
    /// Returns `CleanupError::InvalidSpec` for empty or dotted names, zero
    /// attempts, concurrency outside `1..=Semaphore::MAX_PERMITS`, or a zero
    /// interval.
    pub fn build(self) -> CleanupResult<ResourceSpec> {
        let spec = self.spec;
        let key = spec.key();

        for part in [&spec.service, &spec.resource_type] {
            if part.is_empty() || part.contains('.') {
                return Err(CleanupError::invalid_spec(
                    key,
                    "service and resource names must be non-empty and contain no `.`",
                ));
            }
        }
        if spec.max_attempts == 0 {
            return Err(CleanupError::invalid_spec(key, "max_attempts must be >= 1"));
        }
        if spec.concurrency == 0 || spec.concurrency > Semaphore::MAX_PERMITS {
            return Err(CleanupError::invalid_spec(
                key,
                format!("concurrency must be in 1..={}", Semaphore::MAX_PERMITS),
            ));
        }
        // A zero interval would spin the confirmation loop without yielding.
        if spec.interval.is_zero() {
            return Err(CleanupError::invalid_spec(key, "interval must be > 0"));
        }

        Ok(spec)
    }
}
