//! Outbound side of the count exchange
//!
//! Translates a refresh trigger into one fire-and-forget request per target:
//! first the network-wide "ALL" total, then every tracked node in configured
//! order. Requests are stateless one-shots; responses arrive asynchronously
//! on the inbound path and there is no retry beyond the next scheduled
//! refresh. When no session to the proxy exists the request is dropped with
//! a log line, matching the proxy protocol's behavior of requiring an active
//! session to carry plugin messages.

use crate::transport::{OutboundTransport, TransportError};
use log::{debug, warn};
use shared::{Packet, ALL_TARGET, CONTROL_CHANNEL};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Emits player-count requests for the configured set of nodes.
pub struct CountRequester {
    transport: Arc<dyn OutboundTransport>,
    tracked: Vec<String>,
    verbose: Arc<AtomicBool>,
}

impl CountRequester {
    pub fn new(
        transport: Arc<dyn OutboundTransport>,
        tracked: Vec<String>,
        verbose: Arc<AtomicBool>,
    ) -> Self {
        Self {
            transport,
            tracked,
            verbose,
        }
    }

    /// Nodes polled on every refresh, in request order.
    pub fn tracked_nodes(&self) -> &[String] {
        &self.tracked
    }

    /// Sends one count request for a node, or for the network total when the
    /// target is [`ALL_TARGET`]. Never blocks waiting for the response.
    pub fn request_count(&self, target: &str) {
        // The wire format length-prefixes strings with a u16; a target that
        // cannot be encoded is dropped like any other unsendable request.
        if target.len() > u16::MAX as usize {
            warn!(
                "dropping count request: target identifier is {} bytes, wire limit is {}",
                target.len(),
                u16::MAX
            );
            return;
        }

        let payload = Packet::PlayerCountRequest {
            target: target.to_string(),
        }
        .encode();

        match self.transport.send(CONTROL_CHANNEL, &payload) {
            Ok(()) => {
                if self.verbose.load(Ordering::Relaxed) {
                    debug!("requested player count for {}", target);
                }
            }
            Err(TransportError::NoSession) => {
                if self.verbose.load(Ordering::Relaxed) {
                    warn!(
                        "cannot request player count for {}: no connected session",
                        target
                    );
                }
            }
            Err(err) => {
                warn!("failed to send count request for {}: {}", target, err);
            }
        }
    }

    /// One full refresh pass: the "ALL" request followed by every tracked
    /// node. An empty tracked set still refreshes the network total.
    pub fn refresh_all(&self) {
        self.request_count(ALL_TARGET);
        for node in &self.tracked {
            self.request_count(node);
        }
    }
}
