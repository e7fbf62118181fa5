//! Configuration management for cloudbench
//!
//! This module provides a centralized configuration system that supports:
//! - YAML/TOML/JSON configuration files
//! - Environment variable overrides
//! - Reasonable defaults
//! - Configuration validation

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Services whose resource naming has been verified, so cleanup may rely on
/// the name prefix to pick its targets. Resources of any other service are
/// always deleted.
pub const DEFAULT_VETTED_SERVICES: &[&str] = &[
    "cinder",
    "glance",
    "keystone",
    "neutron",
    "nova",
    "designate",
    "mistral",
    "heat",
    "ceilometer",
];

/// Root configuration structure for cloudbench
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CloudbenchConfig {
    #[serde(default)]
    pub cleanup: CleanupConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CloudbenchConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest priority)
    /// 2. Config file specified by CLOUDBENCH_CONFIG env var
    /// 3. ./config/cloudbench.{yaml,toml,json}
    /// 4. Hardcoded defaults (lowest priority)
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::set_defaults(Config::builder())?;

        if let Ok(config_path) = std::env::var("CLOUDBENCH_CONFIG") {
            builder = builder.add_source(File::with_name(&config_path).required(false));
        }

        builder = builder.add_source(File::with_name("./config/cloudbench").required(false));

        // Example: CLOUDBENCH__CLEANUP__DEFAULTS__MAX_ATTEMPTS=5
        builder = builder.add_source(
            Environment::with_prefix("CLOUDBENCH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("cleanup.vetted_services"),
        );

        let config: CloudbenchConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Set default values for all configuration options
    fn set_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let defaults = ResourceDefaults::default();
        builder
            // Cleanup: name matching
            .set_default("cleanup.name_prefix", default_name_prefix())?
            .set_default("cleanup.delete_matched", true)?
            .set_default("cleanup.vetted_services", default_vetted_services())?
            // Cleanup: per-resource defaults
            .set_default("cleanup.defaults.max_attempts", i64::from(defaults.max_attempts))?
            .set_default("cleanup.defaults.timeout_secs", defaults.timeout_secs as i64)?
            .set_default("cleanup.defaults.interval_secs", defaults.interval_secs as i64)?
            .set_default("cleanup.defaults.concurrency", defaults.concurrency as i64)?
            // Logging
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cleanup.name_prefix.is_empty() {
            return Err(ConfigError::Message(
                "cleanup.name_prefix must not be empty".to_string(),
            ));
        }

        if self.cleanup.defaults.max_attempts == 0 {
            return Err(ConfigError::Message(
                "cleanup.defaults.max_attempts must be > 0".to_string(),
            ));
        }

        if self.cleanup.defaults.concurrency == 0 {
            return Err(ConfigError::Message(
                "cleanup.defaults.concurrency must be > 0".to_string(),
            ));
        }

        if self.cleanup.defaults.interval_secs == 0 {
            return Err(ConfigError::Message(
                "cleanup.defaults.interval_secs must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from a specific file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: CloudbenchConfig = Self::set_defaults(Config::builder())?
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}

/// Resource cleanup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CleanupConfig {
    /// Prefix benchmark scenarios give to every resource they create
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,

    /// Delete resources whose name matches the prefix (true) or those that
    /// do not match it (false)
    #[serde(default = "default_true")]
    pub delete_matched: bool,

    /// Services for which name matching is trusted
    #[serde(default = "default_vetted_services")]
    pub vetted_services: Vec<String>,

    /// Retry/timeout/concurrency applied to resource types that do not
    /// override them
    #[serde(default)]
    pub defaults: ResourceDefaults,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            name_prefix: default_name_prefix(),
            delete_matched: true,
            vetted_services: default_vetted_services(),
            defaults: ResourceDefaults::default(),
        }
    }
}

/// Default per-resource-type cleanup parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResourceDefaults {
    /// Maximum delete attempts for a single resource
    pub max_attempts: u32,

    /// Seconds to wait for a deletion to be confirmed
    pub timeout_secs: u64,

    /// Seconds between status polls and between delete attempts
    pub interval_secs: u64,

    /// Number of resources deleted in parallel per resource type
    pub concurrency: usize,
}

impl Default for ResourceDefaults {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_secs: 600,
            interval_secs: 1,
            concurrency: 20,
        }
    }
}

impl ResourceDefaults {
    /// Get confirmation timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get poll/retry interval
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is not set (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_name_prefix() -> String {
    "cloudbench-".to_string()
}

fn default_vetted_services() -> Vec<String> {
    DEFAULT_VETTED_SERVICES
        .iter()
        .map(|service| (*service).to_string())
        .collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
