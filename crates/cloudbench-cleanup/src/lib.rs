//! Cleanup of resources created by benchmark runs.
//!
//! Resource types are described by a [`ResourceSpec`] and registered with a
//! [`ResourcePlugin`] in a [`ResourceRegistry`]. The [`CleanupOrchestrator`]
//! lists every registered type in each credential scope, keeps the deletion
//! targets picked by the [`DeletionPolicy`], deletes them on a bounded
//! worker pool with retries and waits for each deletion to be confirmed.

pub mod classifier;
pub mod error;
pub mod generic;
pub mod manager;
pub mod orchestrator;
pub mod policy;
pub mod registry;
pub mod report;
pub mod resources;
pub mod scope;
pub mod spec;

pub use classifier::is_not_found;
pub use error::{CleanupError, CleanupResult};
pub use generic::{GenericPlugin, GenericResource};
pub use manager::{ResourceManager, ResourcePlugin};
pub use orchestrator::CleanupOrchestrator;
pub use policy::DeletionPolicy;
pub use registry::{RegisteredResource, ResourceRegistry, ResourceSelector};
pub use report::{CleanupFailure, CleanupReport, FailureReason, ListFailure, TaskOutcome};
pub use scope::{Scope, ScopeKind};
pub use spec::{ResourceSpec, ResourceSpecBuilder};
