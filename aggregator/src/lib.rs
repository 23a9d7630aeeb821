//! # Player Count Aggregator
//!
//! This library aggregates live player-count telemetry across a cluster of
//! game-server nodes sitting behind a proxy. It periodically asks the proxy
//! for the count of every tracked node (plus the network-wide total), caches
//! whatever answers arrive, and exposes per-node, per-group, and
//! network-wide totals to in-process consumers through a synchronous,
//! non-blocking query handle.
//!
//! ## Design
//!
//! The exchange with the proxy is fire-and-forget request/response over an
//! untyped plugin-message channel (wire format in the `shared` crate).
//! Requests carry no sequence numbers and responses may be lost or arrive
//! out of order; the cache simply keeps the last response per node, and the
//! next scheduled refresh is the retry mechanism. Counts read from the
//! cache are therefore at most one refresh interval stale.
//!
//! ## Module Organization
//!
//! - [`store`] — concurrent cache of last-known counts (the only mutable
//!   shared state besides the group registry)
//! - [`registry`] — group name -> member nodes, swapped wholesale on reload
//! - [`query`] — cloneable read surface over store + registry
//! - [`requester`] — outbound count requests, "ALL" first then each node
//! - [`decoder`] — inbound validation and cache updates
//! - [`scheduler`] — cancellable periodic refresh timer
//! - [`transport`] — seam to the host's proxy session
//! - [`config`] — TOML configuration surface
//! - [`service`] — explicit start/stop/reload lifecycle owning the tasks
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use aggregator::config::AggregatorConfig;
//! use aggregator::service::PlayerCountService;
//! use aggregator::transport::ChannelTransport;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AggregatorConfig::parse("servers = [\"lobby-1\"]").unwrap();
//!     let (outbound, _to_proxy) = ChannelTransport::new();
//!     let (_from_proxy_tx, from_proxy_rx) = mpsc::unbounded_channel();
//!
//!     let service = PlayerCountService::start(config, outbound, from_proxy_rx);
//!     let query = service.query();
//!
//!     // Hand `query` to whoever renders counts; it never blocks.
//!     let _ = query.node_count("lobby-1");
//!     service.stop();
//! }
//! ```

pub mod config;
pub mod decoder;
pub mod query;
pub mod registry;
pub mod requester;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod transport;

pub use config::AggregatorConfig;
pub use query::CountQuery;
pub use service::PlayerCountService;
