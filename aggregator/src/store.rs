//! Concurrent cache of last-known player counts
//!
//! The store is written by the inbound decoder and read by the query surface
//! and the refresh path, potentially from different tasks at the same time.
//! Per-node counts live in a sharded concurrent map so a reader never blocks
//! a writer (and vice versa); the network-wide total is a single atomic.
//!
//! Entries are created lazily as responses arrive and are only ever
//! overwritten, never removed. A node that goes offline without a final
//! update keeps reporting its last known count until it answers again.

use dashmap::DashMap;
use log::warn;
use std::sync::atomic::{AtomicU32, Ordering};

/// Last-known player counts per node plus the network-wide total.
#[derive(Debug, Default)]
pub struct CountStore {
    counts: DashMap<String, u32>,
    network_total: AtomicU32,
}

impl CountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the stored count for a node.
    ///
    /// Negative counts are rejected and the prior value is retained; the
    /// proxy should never send one, but a buggy peer must not corrupt the
    /// cache.
    pub fn record_node_count(&self, node: &str, count: i32) {
        if count < 0 {
            warn!("ignoring negative player count {} for server {}", count, node);
            return;
        }
        self.counts.insert(node.to_string(), count as u32);
    }

    /// Overwrites the network-wide total under the same non-negativity rule.
    pub fn record_network_total(&self, count: i32) {
        if count < 0 {
            warn!("ignoring negative network-wide player count {}", count);
            return;
        }
        self.network_total.store(count as u32, Ordering::Relaxed);
    }

    /// Last known count for a node, 0 if no response has arrived yet.
    pub fn node_count(&self, node: &str) -> u32 {
        self.counts.get(node).map(|entry| *entry).unwrap_or(0)
    }

    /// Last known network-wide total, 0 until the first "ALL" response.
    pub fn network_total(&self) -> u32 {
        self.network_total.load(Ordering::Relaxed)
    }
}
