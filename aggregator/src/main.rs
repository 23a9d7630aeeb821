//! Demo binary: runs the aggregator against a simulated proxy.
//!
//! The simulated proxy answers every count request with a slowly drifting
//! random count, which makes the whole pipeline observable end to end:
//! scheduler -> requester -> transport -> proxy -> decoder -> store -> query.

use aggregator::config::AggregatorConfig;
use aggregator::registry::GroupMap;
use aggregator::service::PlayerCountService;
use aggregator::transport::{ChannelTransport, PluginMessage};
use clap::Parser;
use log::{debug, info};
use rand::Rng;
use shared::{Packet, ALL_TARGET, CONTROL_CHANNEL};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Path to a TOML config file; a built-in demo config is used if omitted
    #[clap(short, long)]
    config: Option<PathBuf>,
    /// Override the refresh interval in seconds
    #[clap(short, long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AggregatorConfig::load(path)?,
        None => demo_config(),
    };
    if let Some(secs) = args.interval {
        config.update_interval = secs.max(1);
    }

    // In a real deployment the host hands us its proxy session; here both
    // directions are in-process channels with a fake proxy on the far end.
    let (outbound, to_proxy_rx) = ChannelTransport::new();
    let (from_proxy_tx, from_proxy_rx) = mpsc::unbounded_channel();

    let proxy_handle = tokio::spawn(run_fake_proxy(to_proxy_rx, from_proxy_tx));

    let groups: Vec<String> = config.groups.keys().cloned().collect();
    let service = PlayerCountService::start(config, outbound, from_proxy_rx);
    let query = service.query();

    // Print the query surface periodically so the drift is visible.
    let report_handle = {
        let query = query.clone();
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(5));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                info!("network total: {} players", query.network_count());
                for group in &groups {
                    info!("group {}: {} players", group, query.group_count(group));
                }
            }
        })
    };

    tokio::signal::ctrl_c().await?;
    info!("received Ctrl+C, shutting down");

    service.stop();
    report_handle.abort();
    proxy_handle.abort();

    Ok(())
}

/// Built-in config used when no file is given.
fn demo_config() -> AggregatorConfig {
    let mut groups = GroupMap::new();
    groups.insert(
        "lobbies".to_string(),
        vec!["lobby-1".to_string(), "lobby-2".to_string()],
    );
    groups.insert("games".to_string(), vec!["survival".to_string()]);

    let mut config = AggregatorConfig::default();
    config.servers = vec![
        "lobby-1".to_string(),
        "lobby-2".to_string(),
        "survival".to_string(),
    ];
    config.update_interval = 2;
    config.groups = groups;
    config
}

/// Answers count requests with per-target random walks.
async fn run_fake_proxy(
    mut requests: mpsc::UnboundedReceiver<PluginMessage>,
    responses: mpsc::UnboundedSender<PluginMessage>,
) {
    let mut counts: HashMap<String, i32> = HashMap::new();

    while let Some(msg) = requests.recv().await {
        if msg.channel != CONTROL_CHANNEL {
            continue;
        }
        let target = match Packet::decode(&msg.payload) {
            Ok(Packet::PlayerCountRequest { target }) => target,
            Ok(other) => {
                debug!("fake proxy ignoring {:?}", other);
                continue;
            }
            Err(err) => {
                debug!("fake proxy dropping malformed request: {}", err);
                continue;
            }
        };

        let start = if target == ALL_TARGET { 120 } else { 20 };
        let count = counts.entry(target.clone()).or_insert(start);
        *count = (*count + rand::thread_rng().gen_range(-4..=4)).max(0);

        let reply = Packet::PlayerCountResponse {
            target,
            count: *count,
        }
        .encode();
        if responses
            .send(PluginMessage {
                channel: CONTROL_CHANNEL.to_string(),
                payload: reply,
            })
            .is_err()
        {
            break;
        }
    }
}
