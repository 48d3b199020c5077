//! peerlink daemon — entry point for running a node.

mod shutdown;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use peerlink_network::{Logger, Node, NodeConfig, SeedNode};
use peerlink_utils::{init_logging, LogFormat};

use crate::shutdown::ShutdownController;

#[derive(Parser, Debug)]
#[command(name = "peerlink-daemon", about = "Minimal peer-to-peer node daemon")]
struct Cli {
    /// IPv4 address to bind the listening socket to.
    #[arg(long, env = "PEERLINK_ADDRESS")]
    address: Option<String>,

    /// Port to bind the listening socket to.
    #[arg(long, env = "PEERLINK_PORT")]
    port: Option<u16>,

    /// Advisory minimum number of peers (0 = default).
    #[arg(long, env = "PEERLINK_MIN_PEERS")]
    min_peers: Option<usize>,

    /// Maximum number of outbound peers, also the listen backlog (0 = default).
    #[arg(long, env = "PEERLINK_MAX_PEERS")]
    max_peers: Option<usize>,

    /// Ping timeout in milliseconds (stored, not yet used).
    #[arg(long, env = "PEERLINK_PING_TIMEOUT_MS")]
    ping_timeout_ms: Option<u64>,

    /// Timeout for a single outbound connect in milliseconds.
    #[arg(long, env = "PEERLINK_CONNECT_TIMEOUT_MS")]
    connect_timeout_ms: Option<u64>,

    /// Seed nodes to record (comma-separated "ip:port"). Never dialed.
    #[arg(long, env = "PEERLINK_SEEDS", value_delimiter = ',')]
    seeds: Vec<SeedNode>,

    /// Peers to dial once at startup (comma-separated "ip:port").
    #[arg(long, env = "PEERLINK_CONNECT", value_delimiter = ',')]
    connect: Vec<SeedNode>,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "PEERLINK_LOG_LEVEL")]
    log_level: String,

    /// Log format: "human" or "json".
    #[arg(long, default_value = "human", env = "PEERLINK_LOG_FORMAT")]
    log_format: LogFormat,

    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the node until SIGINT/SIGTERM (default).
    Run,
    /// Print the effective configuration as TOML and exit.
    Config,
}

impl Cli {
    /// Merge the optional config file with flags; flags win.
    fn node_config(&self) -> anyhow::Result<NodeConfig> {
        let base = match &self.config {
            Some(path) => NodeConfig::from_toml_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => NodeConfig::default(),
        };

        Ok(NodeConfig {
            address: self.address.clone().unwrap_or(base.address),
            port: self.port.unwrap_or(base.port),
            min_peers: self.min_peers.unwrap_or(base.min_peers),
            max_peers: self.max_peers.unwrap_or(base.max_peers),
            ping_timeout_ms: self.ping_timeout_ms.unwrap_or(base.ping_timeout_ms),
            connect_timeout_ms: self.connect_timeout_ms.unwrap_or(base.connect_timeout_ms),
            seeds: if self.seeds.is_empty() {
                base.seeds
            } else {
                self.seeds.clone()
            },
            logger: Some(Logger::tracing()),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, &cli.log_level)?;

    let config = cli.node_config()?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        Command::Run => run(config, &cli.connect).await,
    }
}

async fn run(config: NodeConfig, dial: &[SeedNode]) -> anyhow::Result<()> {
    let mut node = Node::create(&config)
        .await
        .with_context(|| format!("failed to create node on {}:{}", config.address, config.port))?;

    tracing::info!(
        address = node.address(),
        port = node.port(),
        max_peers = node.max_peers(),
        seeds = node.seeds().len(),
        "node running (outbound-only), press Ctrl+C to stop"
    );

    for target in dial {
        match node.connect_to_peer(&target.address, target.port).await {
            Ok(()) => tracing::info!(peer = %target, peers = node.peer_count(), "dialed peer"),
            Err(e) => tracing::warn!(peer = %target, error = %e, "could not dial peer"),
        }
    }

    ShutdownController::new().wait().await;

    tracing::info!(peers = node.peer_count(), "shutting down node");
    node.destroy();
    tracing::info!("node stopped");
    Ok(())
}
