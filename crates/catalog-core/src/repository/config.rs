//! Repository behaviour switches

use serde::Deserialize;

/// Default name of the cache container holding every product.
pub const DEFAULT_CONTAINER: &str = "ids";

/// How the store step of an update is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePolicy {
    /// Ignore the store outcome and always overwrite the cached copy.
    /// Updating an unknown id leaves an orphan entry in the cache.
    #[default]
    Lenient,
    /// Propagate store failures, report an unmatched id as not found, and
    /// touch the cache only once the store confirmed the change.
    Strict,
}

/// How the listing decides that the cache holds every product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completeness {
    /// A non-empty container is assumed complete. Unsound once entries are
    /// evicted independently or single reads warm the cache partially.
    #[default]
    NonEmpty,
    /// Trust the container only while a marker written after a full store
    /// scan is present.
    Marker,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub container: String,
    pub update_policy: UpdatePolicy,
    pub completeness: Completeness,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            container: DEFAULT_CONTAINER.to_string(),
            update_policy: UpdatePolicy::default(),
            completeness: Completeness::default(),
        }
    }
}

impl RepositoryConfig {
    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }

    pub fn with_update_policy(mut self, policy: UpdatePolicy) -> Self {
        self.update_policy = policy;
        self
    }

    pub fn with_completeness(mut self, completeness: Completeness) -> Self {
        self.completeness = completeness;
        self
    }

    /// Container holding bookkeeping about the record container.
    pub fn meta_container(&self) -> String {
        format!("{}:meta", self.container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_baseline_behaviour() {
        let config = RepositoryConfig::default();
        assert_eq!(config.container, "ids");
        assert_eq!(config.update_policy, UpdatePolicy::Lenient);
        assert_eq!(config.completeness, Completeness::NonEmpty);
        assert_eq!(config.meta_container(), "ids:meta");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: RepositoryConfig =
            serde_json::from_str(r#"{"update_policy":"strict","completeness":"marker"}"#).unwrap();
        assert_eq!(config.container, "ids");
        assert_eq!(config.update_policy, UpdatePolicy::Strict);
        assert_eq!(config.completeness, Completeness::Marker);
    }
}
