mod api;
mod config;
mod constants;
mod network;

use anyhow::Context;
use clap::Parser;
use ledger_core::{constants::BLOCK_COMMAND, Block, Blockchain};
use ledger_storage::SledStore;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn, Level};

use crate::{api::AppState, config::NodeConfig, network::Network};

#[derive(Parser, Debug)]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// HTTP API address, e.g. 127.0.0.1:8080
    #[arg(long)]
    listen: Option<String>,

    /// TCP port for incoming peer messages
    #[arg(long)]
    peer_port: Option<u16>,

    /// Data directory for sled
    #[arg(long)]
    data_dir: Option<String>,

    /// Leading zero hex digits required for new blocks
    #[arg(long)]
    difficulty: Option<u32>,

    /// Peer address to broadcast to (repeatable)
    #[arg(long = "peer")]
    peers: Vec<String>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::load(path)?,
            None => NodeConfig::default(),
        };
        if let Some(listen) = self.listen {
            config.http_addr = listen;
        }
        if let Some(port) = self.peer_port {
            config.port = port;
        }
        if let Some(dir) = self.data_dir {
            config.db_path = dir;
        }
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        config.nodes.extend(self.peers);
        config.validate()?;
        Ok(config)
    }
}

fn handle_incoming(msg: network::Message, from: SocketAddr) {
    if msg.command != BLOCK_COMMAND {
        info!(%from, command = %msg.command, bytes = msg.data.len(), "peer message");
        return;
    }
    match Block::deserialize(&msg.data) {
        Ok(block) => info!(%from, index = block.index, hash = %block.hash, "peer announced block"),
        Err(e) => warn!(%from, error = %e, "undecodable block from peer"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Args::parse().into_config()?;

    let store = Arc::new(
        SledStore::open(&config.db_path)
            .with_context(|| format!("opening store at {}", config.db_path))?,
    );
    let chain = Blockchain::new(config.difficulty, store.clone())
        .context("initializing blockchain")?;
    info!(tip = %chain.tip(), difficulty = chain.difficulty(), "chain ready");

    let network = Network::new(config.peers());
    let peer_listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("binding peer port {}", config.port))?;
    info!(port = config.port, "listening for peers");
    tokio::spawn(async move {
        if let Err(e) = Network::serve(peer_listener, handle_incoming).await {
            warn!(error = %e, "peer listener stopped");
        }
    });

    let tip_block = chain.last_block()?.serialize()?;
    if let Err(e) = network.broadcast(BLOCK_COMMAND, &tip_block).await {
        warn!(error = %e, "failed to broadcast tip block");
    }

    let app = api::router(AppState::new(chain, network));
    let addr: SocketAddr = config.http_addr.parse()?;
    info!("ledger-node listening on http://{addr}");
    axum::serve(TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    store.close()?;
    info!("ledger-node stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "ledger-node",
            "--listen",
            "0.0.0.0:9999",
            "--difficulty",
            "2",
            "--peer",
            "10.0.0.1:3000",
            "--peer",
            "10.0.0.2:3000",
        ]);
        let config = args.into_config().unwrap();
        assert_eq!(config.http_addr, "0.0.0.0:9999");
        assert_eq!(config.difficulty, 2);
        assert_eq!(config.peers().len(), 2);
        assert_eq!(config.db_path, NodeConfig::default().db_path);
    }

    #[test]
    fn difficulty_flag_beyond_hash_length_is_rejected() {
        let args = Args::parse_from(["ledger-node", "--difficulty", "65"]);
        assert!(args.into_config().is_err());
    }

    #[test]
    fn no_flags_gives_defaults() {
        let config = Args::parse_from(["ledger-node"]).into_config().unwrap();
        assert_eq!(config, NodeConfig::default());
    }
}
