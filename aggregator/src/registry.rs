//! Static mapping from group names to their member nodes
//!
//! Loaded from configuration and read-only between reloads. A reload swaps
//! the whole mapping behind an `Arc`, so concurrent readers observe either
//! the old registry or the new one wholesale, never a half-updated mix.

use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Group name -> ordered member node identifiers.
pub type GroupMap = HashMap<String, Vec<String>>;

/// Read-mostly registry of server groups.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: RwLock<Arc<GroupMap>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entire registry in one atomic swap.
    pub fn load(&self, groups: GroupMap) {
        for (name, members) in &groups {
            debug!("loaded group {} with servers: {}", name, members.join(", "));
        }
        let mut guard = self.groups.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(groups);
    }

    /// Member nodes of a group, in configured order. Empty for unknown groups.
    pub fn members_of(&self, group: &str) -> Vec<String> {
        self.snapshot().get(group).cloned().unwrap_or_default()
    }

    /// Cheap point-in-time view of the whole registry.
    pub fn snapshot(&self) -> Arc<GroupMap> {
        Arc::clone(&self.groups.read().unwrap_or_else(|e| e.into_inner()))
    }
}
