//! Inbound side of the count exchange
//!
//! Validates raw plugin messages and applies player-count responses to the
//! store. Everything suspicious is dropped, never raised: messages on the
//! wrong channel, unknown tags, and malformed payloads all leave the cache
//! exactly as it was. Responses overwrite in arrival order, so the stored
//! value is always the last response received, not the last request sent.

use crate::store::CountStore;
use log::{debug, info, warn};
use shared::{Packet, ALL_TARGET, CONTROL_CHANNEL};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Applies decoded proxy responses to the count store.
pub struct ResponseDecoder {
    store: Arc<CountStore>,
    verbose: Arc<AtomicBool>,
}

impl ResponseDecoder {
    pub fn new(store: Arc<CountStore>, verbose: Arc<AtomicBool>) -> Self {
        Self { store, verbose }
    }

    /// Handles one raw inbound message.
    ///
    /// Only the control channel is interesting; anything else is another
    /// subsystem's traffic and is ignored without logging.
    pub fn on_message(&self, channel: &str, payload: &[u8]) {
        if channel != CONTROL_CHANNEL {
            return;
        }

        let packet = match Packet::decode(payload) {
            Ok(packet) => packet,
            Err(err) => {
                warn!("dropping malformed plugin message: {}", err);
                return;
            }
        };

        match packet {
            Packet::PlayerCountResponse { target, count } => {
                if target == ALL_TARGET {
                    self.store.record_network_total(count);
                    if self.verbose.load(Ordering::Relaxed) {
                        info!("network-wide player count: {}", count);
                    }
                } else {
                    self.store.record_node_count(&target, count);
                    if self.verbose.load(Ordering::Relaxed) {
                        info!("server {} player count: {}", target, count);
                    }
                }
            }
            // Requests travel toward the proxy; one showing up here means a
            // peer echoed it back, and there is nothing to apply.
            Packet::PlayerCountRequest { .. } => {}
            Packet::Unknown { tag } => {
                debug!("ignoring plugin message with unhandled tag {:?}", tag);
            }
        }
    }
}
