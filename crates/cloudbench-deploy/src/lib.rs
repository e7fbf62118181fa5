//! Deployment engines: where a benchmark run gets its target cloud and
//! credentials from.

pub mod engine;
pub mod error;
pub mod existing;

pub use engine::DeployEngine;
pub use error::{DeployError, DeployResult};
pub use existing::{ExistingCloud, ExistingCloudConfig, UserConfig};
