//! Read-side query surface over the count store and group registry
//!
//! This is the handle other in-process consumers (a templating system, an
//! admin command) hold on to. Every method is synchronous, total, and backed
//! only by the local cache, so answers may be stale by up to one refresh
//! interval but never block and never fail.

use crate::registry::GroupRegistry;
use crate::store::CountStore;
use std::sync::Arc;

/// Cloneable read handle for per-node, per-group, and network-wide counts.
#[derive(Clone)]
pub struct CountQuery {
    store: Arc<CountStore>,
    registry: Arc<GroupRegistry>,
}

impl CountQuery {
    pub fn new(store: Arc<CountStore>, registry: Arc<GroupRegistry>) -> Self {
        Self { store, registry }
    }

    /// Last known player count for one node; 0 for unknown nodes.
    pub fn node_count(&self, node: &str) -> u32 {
        self.store.node_count(node)
    }

    /// Sum of the member node counts of a group; 0 for unknown groups.
    /// Saturates at `u32::MAX` rather than overflowing, so the query stays
    /// total even for absurd cached counts.
    pub fn group_count(&self, group: &str) -> u32 {
        self.registry
            .members_of(group)
            .iter()
            .fold(0u32, |total, member| {
                total.saturating_add(self.store.node_count(member))
            })
    }

    /// Last known network-wide total as reported by the proxy.
    pub fn network_count(&self) -> u32 {
        self.store.network_total()
    }
}
