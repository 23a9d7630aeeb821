//! Service lifecycle tying the pieces together
//!
//! The embedding application owns a [`PlayerCountService`]: it starts one
//! with a config and a transport, hands the query handle to whoever renders
//! counts, and calls `reload`/`toggle_logging` from its admin surface. There
//! is no global instance; everything the subsystem needs is passed in
//! explicitly and torn down deterministically on `stop`.

use crate::config::AggregatorConfig;
use crate::decoder::ResponseDecoder;
use crate::query::CountQuery;
use crate::registry::GroupRegistry;
use crate::requester::CountRequester;
use crate::scheduler::RefreshScheduler;
use crate::store::CountStore;
use crate::transport::{OutboundTransport, PluginMessage};
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Running player-count aggregation subsystem.
pub struct PlayerCountService {
    store: Arc<CountStore>,
    registry: Arc<GroupRegistry>,
    transport: Arc<dyn OutboundTransport>,
    requester: Arc<CountRequester>,
    scheduler: RefreshScheduler,
    decode_loop: JoinHandle<()>,
    verbose: Arc<AtomicBool>,
}

impl PlayerCountService {
    /// Starts the subsystem: loads the registry, wires the decoder to the
    /// inbound channel, and kicks off the refresh timer.
    pub fn start(
        config: AggregatorConfig,
        outbound: Arc<dyn OutboundTransport>,
        mut inbound: mpsc::UnboundedReceiver<PluginMessage>,
    ) -> Self {
        let verbose = Arc::new(AtomicBool::new(config.logging.enable));
        let store = Arc::new(CountStore::new());

        let registry = Arc::new(GroupRegistry::new());
        registry.load(config.groups.clone());

        let requester = Arc::new(CountRequester::new(
            Arc::clone(&outbound),
            config.servers.clone(),
            Arc::clone(&verbose),
        ));

        let decoder = ResponseDecoder::new(Arc::clone(&store), Arc::clone(&verbose));
        let decode_loop = tokio::spawn(async move {
            while let Some(msg) = inbound.recv().await {
                decoder.on_message(&msg.channel, &msg.payload);
            }
        });

        let scheduler = RefreshScheduler::start(Arc::clone(&requester), config.refresh_period());

        info!(
            "player count aggregator started: {} tracked servers, {} groups, refresh every {}s",
            config.servers.len(),
            config.groups.len(),
            config.update_interval
        );

        Self {
            store,
            registry,
            transport: outbound,
            requester,
            scheduler,
            decode_loop,
            verbose,
        }
    }

    /// Stops the refresh timer and the inbound decode loop. Cached counts
    /// remain readable through handles that were cloned off earlier.
    pub fn stop(&self) {
        self.scheduler.stop();
        self.decode_loop.abort();
        info!("player count aggregator stopped");
    }

    /// Applies a new configuration: swaps the group registry wholesale,
    /// replaces the tracked node set, and restarts the refresh timer with
    /// the new interval. The old timer is stopped before the new one starts.
    /// Counts already cached survive the reload.
    pub fn reload(&mut self, config: AggregatorConfig) {
        self.scheduler.stop();

        self.verbose.store(config.logging.enable, Ordering::Relaxed);
        self.registry.load(config.groups.clone());
        self.requester = Arc::new(CountRequester::new(
            Arc::clone(&self.transport),
            config.servers.clone(),
            Arc::clone(&self.verbose),
        ));
        self.scheduler =
            RefreshScheduler::start(Arc::clone(&self.requester), config.refresh_period());

        info!(
            "player count aggregator reloaded: {} tracked servers, {} groups, refresh every {}s",
            config.servers.len(),
            config.groups.len(),
            config.update_interval
        );
    }

    /// Flips the diagnostic verbosity flag and returns the new state. Has no
    /// effect on counts or on the protocol.
    pub fn toggle_logging(&self) -> bool {
        let enabled = !self.verbose.fetch_xor(true, Ordering::Relaxed);
        info!(
            "per-response logging {}",
            if enabled { "enabled" } else { "disabled" }
        );
        enabled
    }

    /// Issues one refresh pass immediately, outside the schedule.
    pub fn refresh_now(&self) {
        self.requester.refresh_all();
    }

    /// Cloneable, non-blocking read handle for external consumers.
    pub fn query(&self) -> CountQuery {
        CountQuery::new(Arc::clone(&self.store), Arc::clone(&self.registry))
    }

    /// Nodes currently polled on every refresh.
    pub fn tracked_nodes(&self) -> &[String] {
        self.requester.tracked_nodes()
    }
}

impl Drop for PlayerCountService {
    fn drop(&mut self) {
        self.decode_loop.abort();
        // RefreshScheduler aborts its own task on drop.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::GroupMap;
    use crate::transport::ChannelTransport;
    use shared::{Packet, CONTROL_CHANNEL};
    use std::time::Duration;

    fn config_with(servers: &[&str], groups: GroupMap) -> AggregatorConfig {
        AggregatorConfig {
            servers: servers.iter().map(|s| s.to_string()).collect(),
            groups,
            ..AggregatorConfig::default()
        }
    }

    fn response(target: &str, count: i32) -> PluginMessage {
        PluginMessage {
            channel: CONTROL_CHANNEL.to_string(),
            payload: Packet::PlayerCountResponse {
                target: target.to_string(),
                count,
            }
            .encode(),
        }
    }

    #[tokio::test]
    async fn test_inbound_responses_reach_the_query_surface() {
        let (outbound, _proxy_rx) = ChannelTransport::new();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let service =
            PlayerCountService::start(config_with(&["survival"], GroupMap::new()), outbound, inbound_rx);
        let query = service.query();

        inbound_tx.send(response("survival", 42)).unwrap();
        inbound_tx.send(response("ALL", 137)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(query.node_count("survival"), 42);
        assert_eq!(query.network_count(), 137);

        service.stop();
    }

    #[tokio::test]
    async fn test_refresh_now_requests_all_then_tracked() {
        let (outbound, mut proxy_rx) = ChannelTransport::new();
        let (_inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let service =
            PlayerCountService::start(config_with(&["a", "b"], GroupMap::new()), outbound, inbound_rx);

        service.refresh_now();

        let mut targets = Vec::new();
        while let Ok(msg) = proxy_rx.try_recv() {
            match Packet::decode(&msg.payload).unwrap() {
                Packet::PlayerCountRequest { target } => targets.push(target),
                other => panic!("unexpected outbound packet: {:?}", other),
            }
        }
        assert_eq!(targets, vec!["ALL", "a", "b"]);

        service.stop();
    }

    #[tokio::test]
    async fn test_reload_swaps_groups_and_tracked_nodes() {
        let (outbound, _proxy_rx) = ChannelTransport::new();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let mut groups = GroupMap::new();
        groups.insert("old".to_string(), vec!["a".to_string()]);
        let mut service =
            PlayerCountService::start(config_with(&["a"], groups), outbound, inbound_rx);
        let query = service.query();

        inbound_tx.send(response("a", 5)).unwrap();
        inbound_tx.send(response("b", 11)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(query.group_count("old"), 5);

        let mut new_groups = GroupMap::new();
        new_groups.insert("new".to_string(), vec!["b".to_string()]);
        service.reload(config_with(&["b"], new_groups));

        // New membership is visible immediately; old group is gone; cached
        // counts survived the reload.
        assert_eq!(query.group_count("new"), 11);
        assert_eq!(query.group_count("old"), 0);
        assert_eq!(query.node_count("a"), 5);
        assert_eq!(service.tracked_nodes(), ["b".to_string()]);

        service.stop();
    }

    #[tokio::test]
    async fn test_empty_config_degrades_to_zero_reporting() {
        let (outbound, _proxy_rx) = ChannelTransport::new();
        let (_inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let service =
            PlayerCountService::start(AggregatorConfig::default(), outbound, inbound_rx);
        let query = service.query();

        assert_eq!(query.node_count("anything"), 0);
        assert_eq!(query.group_count("anything"), 0);
        assert_eq!(query.network_count(), 0);

        service.stop();
    }

    #[tokio::test]
    async fn test_toggle_logging_flips_each_call() {
        let (outbound, _proxy_rx) = ChannelTransport::new();
        let (_inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let service =
            PlayerCountService::start(AggregatorConfig::default(), outbound, inbound_rx);

        // Default config enables logging, so the first toggle disables it.
        assert!(!service.toggle_logging());
        assert!(service.toggle_logging());

        service.stop();
    }
}
