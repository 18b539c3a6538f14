//! Skip and apply policies derived from the configuration
//!
//! [`SkipPolicy`] bounds traversal (leaf types, user-skipped object types);
//! [`ApplyPolicy`] governs how a stored object is sent to a target during a
//! restore. Both are built once per run and passed by reference into the
//! components that consult them.

use std::collections::{BTreeMap, BTreeSet};

use super::SyncConfig;

/// Replication mode for a restore run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyMode {
    /// POST objects that don't exist yet
    #[default]
    Create,
    /// PATCH allow-listed object types in place
    Patch,
    /// DELETE allow-listed object types
    Delete,
}

/// Object types that bound traversal
#[derive(Debug, Clone, Default)]
pub struct SkipPolicy {
    leaf_types: BTreeSet<String>,
    skip_objects: BTreeSet<String>,
}

impl SkipPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            leaf_types: config.semp.leaf_nodes.iter().cloned().collect(),
            skip_objects: config.skip_objects.iter().cloned().collect(),
        }
    }

    #[cfg(test)]
    pub fn with_leaves<I: IntoIterator<Item = S>, S: Into<String>>(leaves: I) -> Self {
        Self {
            leaf_types: leaves.into_iter().map(Into::into).collect(),
            skip_objects: BTreeSet::new(),
        }
    }

    /// Traversal pre-condition: true when this path segment ends the branch
    pub fn is_leaf(&self, segment: &str) -> bool {
        self.leaf_types.contains(segment)
    }

    /// True when the user excluded this object type from replication
    pub fn is_skipped(&self, object_type: &str) -> bool {
        self.skip_objects.contains(object_type)
    }
}

/// Rename, filter and mode configuration for one restore run
#[derive(Debug, Clone, Default)]
pub struct ApplyPolicy {
    pub mode: ApplyMode,
    /// Allow-list of object types; empty means "everything"
    pub items: BTreeSet<String>,
    /// Field name -> values excluded from replication
    pub skip_tags: BTreeMap<String, Vec<String>>,
    /// Field name -> the only values allowed through; None disables filtering
    pub apply_filter: Option<BTreeMap<String, Vec<String>>>,
    /// VPN objects are rewritten to at apply time
    pub target_vpn: String,
}

impl ApplyPolicy {
    pub fn from_config(
        config: &SyncConfig,
        mode: ApplyMode,
        items: &[String],
        target_vpn: &str,
    ) -> Self {
        Self {
            mode,
            items: items.iter().cloned().collect(),
            skip_tags: config.skip_tags.clone(),
            apply_filter: config.apply_filter.clone(),
            target_vpn: target_vpn.to_string(),
        }
    }

    /// True when the allow-list admits this object type (or no list is set)
    pub fn allows(&self, object_type: &str) -> bool {
        self.items.is_empty() || self.items.contains(object_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_and_skip_lookup() {
        let mut config = SyncConfig::default();
        config.semp.leaf_nodes = vec!["subscriptions".to_string()];
        config.skip_objects = vec!["certAuthorities".to_string()];

        let policy = SkipPolicy::from_config(&config);
        assert!(policy.is_leaf("subscriptions"));
        assert!(!policy.is_leaf("queues"));
        assert!(policy.is_skipped("certAuthorities"));
        assert!(!policy.is_skipped("queues"));
    }

    #[test]
    fn test_empty_items_allows_everything() {
        let policy = ApplyPolicy::default();
        assert!(policy.allows("queues"));
    }

    #[test]
    fn test_items_restrict_types() {
        let policy = ApplyPolicy {
            items: ["queues".to_string()].into_iter().collect(),
            ..ApplyPolicy::default()
        };
        assert!(policy.allows("queues"));
        assert!(!policy.allows("aclProfiles"));
    }
}
