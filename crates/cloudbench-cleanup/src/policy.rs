//! Deletion-target policy.

use std::collections::HashSet;

use cloudbench_core::CleanupConfig;

/// Decides whether a listed resource is a deletion target.
///
/// Resources of services outside `vetted_services` are always targets. For
/// vetted services the name must start with `prefix` (or must not, when
/// `delete_matched` is false); a resource without a name is never a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPolicy {
    pub prefix: String,
    pub delete_matched: bool,
    pub vetted_services: HashSet<String>,
}

impl DeletionPolicy {
    #[must_use]
    pub fn from_config(config: &CleanupConfig) -> Self {
        Self {
            prefix: config.name_prefix.clone(),
            delete_matched: config.delete_matched,
            vetted_services: config.vetted_services.iter().cloned().collect(),
        }
    }

    /// Applies the policy to one resource.
    #[must_use]
    pub fn is_target(&self, service: &str, name: Option<&str>) -> bool {
        // Name matching is only trusted for vetted services; everything else
        // is deleted unconditionally.
        if !self.vetted_services.contains(service) {
            return true;
        }

        match name {
            None => false,
            Some(name) if name.starts_with(&self.prefix) => self.delete_matched,
            Some(_) => !self.delete_matched,
        }
    }
}

impl Default for DeletionPolicy {
    fn default() -> Self {
        Self::from_config(&CleanupConfig::default())
    }
}
