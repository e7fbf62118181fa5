//! Catalog of cleanable resource types.
//!
//! Populated once at startup (see [`crate::resources::register_defaults`]),
//! then shared read-only behind an `Arc` for the duration of a run.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{CleanupError, CleanupResult};
use crate::generic::GenericPlugin;
use crate::manager::ResourcePlugin;
use crate::spec::ResourceSpec;

/// Selects resource types by service or by `service.resource`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceSelector {
    /// Every resource type of a service.
    Service(String),
    /// Exactly one resource type.
    Resource { service: String, resource: String },
}

impl ResourceSelector {
    #[must_use]
    pub fn matches(&self, spec: &ResourceSpec) -> bool {
        match self {
            Self::Service(service) => spec.service == *service,
            Self::Resource { service, resource } => {
                spec.service == *service && spec.resource_type == *resource
            }
        }
    }
}

impl FromStr for ResourceSelector {
    type Err = CleanupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || CleanupError::InvalidSelector(s.to_string());

        match s.split_once('.') {
            None if !s.is_empty() => Ok(Self::Service(s.to_string())),
            None => Err(invalid()),
            Some((service, resource))
                if !service.is_empty() && !resource.is_empty() && !resource.contains('.') =>
            {
                Ok(Self::Resource {
                    service: service.to_string(),
                    resource: resource.to_string(),
                })
            }
            Some(_) => Err(invalid()),
        }
    }
}

impl fmt::Display for ResourceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service(service) => f.write_str(service),
            Self::Resource { service, resource } => write!(f, "{}.{}", service, resource),
        }
    }
}

/// A spec together with the plugin that lists its instances.
#[derive(Clone)]
pub struct RegisteredResource {
    pub spec: Arc<ResourceSpec>,
    pub plugin: Arc<dyn ResourcePlugin>,
    seq: u64,
}

impl fmt::Debug for RegisteredResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredResource")
            .field("spec", &self.spec)
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

/// Registry keyed by `(service, resource_type)`.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    entries: HashMap<(String, String), RegisteredResource>,
    next_seq: u64,
}

impl ResourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource type. A later registration of the same key
    /// replaces the earlier one and takes a fresh registration sequence.
    ///
    /// Returns the replaced spec, if any.
    pub fn register(
        &mut self,
        spec: ResourceSpec,
        plugin: Arc<dyn ResourcePlugin>,
    ) -> Option<Arc<ResourceSpec>> {
        let key = (spec.service.clone(), spec.resource_type.clone());
        let seq = self.next_seq;
        self.next_seq += 1;

        tracing::debug!(resource = %spec, order = spec.order, "Registering cleanup resource");

        self.entries
            .insert(
                key,
                RegisteredResource {
                    spec: Arc::new(spec),
                    plugin,
                    seq,
                },
            )
            .map(|previous| previous.spec)
    }

    /// Registers a resource type handled by [`GenericPlugin`].
    pub fn register_generic(&mut self, spec: ResourceSpec) -> Option<Arc<ResourceSpec>> {
        self.register(spec, Arc::new(GenericPlugin))
    }

    #[must_use]
    pub fn get(&self, service: &str, resource_type: &str) -> Option<&RegisteredResource> {
        self.entries
            .get(&(service.to_string(), resource_type.to_string()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resource types matching any selector (all of them when `selectors` is
    /// empty), by ascending `order`, ties in registration order.
    ///
    /// # Errors
    ///
    /// Returns `CleanupError::UnknownSelector` if a selector matches nothing.
    pub fn resources_for(
        &self,
        selectors: &[ResourceSelector],
    ) -> CleanupResult<Vec<RegisteredResource>> {
        if let Some(unknown) = selectors
            .iter()
            .find(|selector| !self.entries.values().any(|e| selector.matches(&e.spec)))
        {
            return Err(CleanupError::UnknownSelector(unknown.to_string()));
        }

        let mut matched: Vec<RegisteredResource> = self
            .entries
            .values()
            .filter(|e| selectors.is_empty() || selectors.iter().any(|s| s.matches(&e.spec)))
            .cloned()
            .collect();
        matched.sort_by_key(|e| (e.spec.order, e.seq));

        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(service: &str, resource: &str, order: i32) -> ResourceSpec {
        ResourceSpec::builder(service, resource)
            .order(order)
            .build()
            .unwrap()
    }

    fn keys(resources: &[RegisteredResource]) -> Vec<String> {
        resources.iter().map(|r| r.spec.key()).collect()
    }

    #[test]
    fn test_selector_parsing() {
        assert_eq!(
            "nova".parse::<ResourceSelector>().unwrap(),
            ResourceSelector::Service("nova".to_string())
        );
        assert_eq!(
            " neutron.ports ".parse::<ResourceSelector>().unwrap(),
            ResourceSelector::Resource {
                service: "neutron".to_string(),
                resource: "ports".to_string()
            }
        );
        for bad in ["", ".ports", "neutron.", "a.b.c"] {
            assert!(matches!(
                bad.parse::<ResourceSelector>(),
                Err(CleanupError::InvalidSelector(_))
            ));
        }
    }

    #[test]
    fn test_resources_sorted_by_order_then_registration() {
        let mut registry = ResourceRegistry::new();
        registry.register_generic(spec("neutron", "networks", 302));
        registry.register_generic(spec("nova", "servers", 200));
        registry.register_generic(spec("cinder", "volumes", 200));
        registry.register_generic(spec("neutron", "ports", 300));

        let all = registry.resources_for(&[]).unwrap();
        assert_eq!(
            keys(&all),
            vec!["nova.servers", "cinder.volumes", "neutron.ports", "neutron.networks"]
        );
    }

    #[test]
    fn test_selectors_filter_and_unknown_selector_fails() {
        let mut registry = ResourceRegistry::new();
        registry.register_generic(spec("neutron", "networks", 302));
        registry.register_generic(spec("neutron", "ports", 300));
        registry.register_generic(spec("nova", "servers", 200));

        let neutron = registry
            .resources_for(&["neutron".parse().unwrap()])
            .unwrap();
        assert_eq!(keys(&neutron), vec!["neutron.ports", "neutron.networks"]);

        let one = registry
            .resources_for(&["nova.servers".parse().unwrap()])
            .unwrap();
        assert_eq!(keys(&one), vec!["nova.servers"]);

        let err = registry
            .resources_for(&["nova.keypairs".parse().unwrap()])
            .unwrap_err();
        assert!(matches!(err, CleanupError::UnknownSelector(s) if s == "nova.keypairs"));
    }

    #[test]
    fn test_duplicate_registration_last_wins() {
        let mut registry = ResourceRegistry::new();
        registry.register_generic(spec("nova", "servers", 200));
        registry.register_generic(spec("glance", "images", 200));
        let replaced = registry.register_generic(spec("nova", "servers", 200));

        assert!(replaced.is_some());
        assert_eq!(registry.len(), 2);
        // Re-registration moves the key behind its order peers.
        assert_eq!(
            keys(&registry.resources_for(&[]).unwrap()),
            vec!["glance.images", "nova.servers"]
        );
    }
}
