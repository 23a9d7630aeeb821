//! Transport seam between the aggregator and the host's proxy connection
//!
//! The aggregator never owns a socket. Outbound, it needs one capability:
//! deliver an opaque payload on a named channel through whatever session the
//! host currently has to the proxy. Inbound, the host feeds raw
//! `(channel, payload)` messages into the service, which forwards them to
//! the decoder.
//!
//! `ChannelTransport` is the in-process implementation used by the demo
//! binary and the test suites: sends land on a tokio mpsc channel where a
//! simulated proxy (or a test assertion) can pick them up.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Raw message as it crosses the channel boundary in either direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMessage {
    pub channel: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// No connected session exists to route the message through.
    #[error("no connected session to route the message through")]
    NoSession,
    /// The receiving end of the transport has gone away.
    #[error("transport channel closed")]
    Closed,
}

/// Capability to push a payload toward the proxy.
pub trait OutboundTransport: Send + Sync {
    fn send(&self, channel: &str, payload: &[u8]) -> Result<(), TransportError>;
}

/// mpsc-backed transport for tests and the demo binary.
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<PluginMessage>,
    connected: AtomicBool,
}

impl ChannelTransport {
    /// Creates the transport plus the receiver a simulated proxy reads from.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PluginMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            tx,
            connected: AtomicBool::new(true),
        });
        (transport, rx)
    }

    /// Simulates the proxy session appearing or disappearing.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }
}

impl OutboundTransport for ChannelTransport {
    fn send(&self, channel: &str, payload: &[u8]) -> Result<(), TransportError> {
        if !self.connected.load(Ordering::Relaxed) {
            return Err(TransportError::NoSession);
        }
        self.tx
            .send(PluginMessage {
                channel: channel.to_string(),
                payload: payload.to_vec(),
            })
            .map_err(|_| TransportError::Closed)
    }
}
