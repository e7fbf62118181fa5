//! Built-in cleanable resource types.
//!
//! Orders follow dependencies: stacks own servers, servers hold ports,
//! ports live on subnets and networks, objects sit inside containers.
//! Identity objects go last so nothing still needs them.

pub mod ceilometer;
pub mod heat;
pub mod neutron;
pub mod swift;

use std::sync::Arc;

use cloudbench_core::ResourceDefaults;

use crate::error::CleanupResult;
use crate::generic::GenericPlugin;
use crate::manager::ResourcePlugin;
use crate::registry::ResourceRegistry;
use crate::spec::{ResourceSpec, ResourceSpecBuilder};

pub const HEAT_ORDER: i32 = 100;
pub const NOVA_ORDER: i32 = 200;
pub const NEUTRON_ORDER: i32 = 300;
pub const CINDER_ORDER: i32 = 400;
pub const GLANCE_ORDER: i32 = 500;
pub const CEILOMETER_ORDER: i32 = 700;
pub const SWIFT_ORDER: i32 = 1000;
pub const KEYSTONE_ORDER: i32 = 9000;

/// Registers every built-in resource type, taking retry, timeout and
/// concurrency from `defaults`.
///
/// # Errors
///
/// Returns `CleanupError::InvalidSpec` when `defaults` are out of range.
pub fn register_defaults(
    registry: &mut ResourceRegistry,
    defaults: &ResourceDefaults,
) -> CleanupResult<()> {
    let spec = |service: &str, resource: &str, order: i32| -> ResourceSpecBuilder {
        ResourceSpec::builder(service, resource)
            .defaults(defaults)
            .order(order)
    };
    let generic = || -> Arc<dyn ResourcePlugin> { Arc::new(GenericPlugin) };

    registry.register(
        spec("heat", "stacks", HEAT_ORDER).build()?,
        Arc::new(heat::StackPlugin),
    );
    registry.register(spec("nova", "servers", NOVA_ORDER).build()?, generic());
    registry.register(
        spec("neutron", "pools", NEUTRON_ORDER - 1)
            .tenant_resource(true)
            .build()?,
        Arc::new(neutron::PoolPlugin),
    );
    registry.register(spec("neutron", "ports", NEUTRON_ORDER).build()?, generic());
    registry.register(spec("neutron", "subnets", NEUTRON_ORDER + 1).build()?, generic());
    registry.register(spec("neutron", "networks", NEUTRON_ORDER + 2).build()?, generic());
    registry.register(spec("cinder", "volumes", CINDER_ORDER).build()?, generic());
    registry.register(spec("glance", "images", GLANCE_ORDER).build()?, generic());
    registry.register(
        spec("ceilometer", "alarms", CEILOMETER_ORDER).build()?,
        Arc::new(ceilometer::AlarmPlugin),
    );
    registry.register(
        spec("swift", "objects", SWIFT_ORDER).build()?,
        Arc::new(swift::ObjectPlugin),
    );
    registry.register(
        spec("swift", swift::CONTAINERS, SWIFT_ORDER + 1).build()?,
        generic(),
    );
    registry.register(
        spec("keystone", "users", KEYSTONE_ORDER)
            .admin_required(true)
            .admin_only(true)
            .build()?,
        generic(),
    );

    Ok(())
}

/// A registry holding only the built-in resource types.
///
/// # Errors
///
/// See [`register_defaults`].
pub fn default_registry(defaults: &ResourceDefaults) -> CleanupResult<ResourceRegistry> {
    let mut registry = ResourceRegistry::new();
    register_defaults(&mut registry, defaults)?;
    Ok(registry)
}
