//! Core types, credentials and service-client contracts for cloudbench.

pub mod atomic;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod ids;
pub mod logging;
pub mod metrics;
pub mod mock;

pub use atomic::{ActionTimer, AtomicAction, AtomicActions};
pub use client::{ClientProvider, CloudError, CloudResult, ListQuery, RawResource, ServiceClient};
pub use config::{CleanupConfig, CloudbenchConfig, LoggingConfig, ResourceDefaults};
pub use credential::{Clients, Credential, CredentialSet, EndpointType, Permission};
pub use error::{CoreError, CoreResult};
pub use ids::{ResourceId, TenantId};
