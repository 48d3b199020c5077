//! The node: one listening socket plus a bounded set of outbound peers.
//!
//! The node is outbound-only. Its listening socket is bound and listening
//! from construction onward, but nothing accepts from it; inbound attempts
//! wait in the backlog until the node is destroyed. Peers are added only by
//! [`Node::connect_to_peer`] and removed by [`Node::disconnect_from_peer`]
//! or by tearing the node down.
//!
//! A `Node` is single-owner state. Mutating operations take `&mut self`;
//! callers sharing a node across tasks wrap the whole node in a lock.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use crate::config::{
    NodeConfig, SeedNode, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_MAX_PEERS, DEFAULT_MIN_PEERS,
    DEFAULT_PING_TIMEOUT_MS,
};
use crate::logger::Logger;
use crate::peer::{Peer, PeerRegistry};
use crate::NetworkError;

/// Local participant owning a listening socket and its outbound peers.
pub struct Node {
    address: String,
    port: u16,
    min_peers: usize,
    max_peers: usize,
    ping_timeout: Duration,
    connect_timeout: Duration,
    logger: Logger,
    listener: Option<TcpListener>,
    peers: PeerRegistry<TcpStream>,
    seeds: Vec<SeedNode>,
}

impl Node {
    /// Validate `config`, bind the listening socket and start listening.
    ///
    /// Fails fast: nothing is returned unless the socket is listening, and
    /// every resource acquired before a failing step is released before the
    /// error is returned. Must be called from within a Tokio runtime.
    pub async fn create(config: &NodeConfig) -> Result<Self, NetworkError> {
        if config.address.is_empty() {
            return Err(NetworkError::InvalidConfig("bind address is empty".into()));
        }
        if config.port == 0 {
            return Err(NetworkError::InvalidConfig("bind port must be positive".into()));
        }

        let logger = match &config.logger {
            Some(logger) if logger.has_info() => logger.clone(),
            _ => Logger::noop(),
        };

        let min_peers = non_zero_or(config.min_peers, DEFAULT_MIN_PEERS);
        let max_peers = non_zero_or(config.max_peers, DEFAULT_MAX_PEERS);
        let ping_timeout_ms = non_zero_or(config.ping_timeout_ms, DEFAULT_PING_TIMEOUT_MS);
        let connect_timeout_ms =
            non_zero_or(config.connect_timeout_ms, DEFAULT_CONNECT_TIMEOUT_MS);

        let seeds = copy_seeds(&config.seeds, &logger);

        let listener = bind_listener(&config.address, config.port, max_peers, &logger)?;

        logger.info(&format!(
            "Node created successfully on {}:{} (max peers {max_peers})",
            config.address, config.port
        ));

        Ok(Self {
            address: config.address.clone(),
            port: config.port,
            min_peers,
            max_peers,
            ping_timeout: Duration::from_millis(ping_timeout_ms),
            connect_timeout: Duration::from_millis(connect_timeout_ms),
            logger,
            listener: Some(listener),
            peers: PeerRegistry::new(),
            seeds,
        })
    }

    /// Close the listening socket and every peer connection.
    ///
    /// Consumes the node, so a second destroy cannot be expressed. Dropping
    /// a node without calling this performs the same release.
    pub fn destroy(mut self) {
        self.release();
    }

    /// Open an outbound connection to `address:port` and register it.
    ///
    /// All-or-nothing: on any error the registry is unchanged and the socket
    /// opened for the attempt (if any) is closed.
    pub async fn connect_to_peer(&mut self, address: &str, port: u16) -> Result<(), NetworkError> {
        if port == 0 {
            return Err(NetworkError::InvalidArgument("peer port must be positive".into()));
        }

        if self.peers.connected_count() >= self.max_peers {
            self.logger
                .warn(&format!("Maximum peer limit reached ({})", self.max_peers));
            return Err(NetworkError::PeerLimitReached {
                max: self.max_peers,
            });
        }

        let socket = TcpSocket::new_v4()
            .map_err(log_socket_err(&self.logger, "socket", "Socket creation failed"))?;

        let Ok(ip) = address.parse::<Ipv4Addr>() else {
            self.logger.error(&format!("Invalid address: {address:?}"));
            return Err(NetworkError::InvalidAddress(address.to_string()));
        };
        let addr = SocketAddrV4::new(ip, port);

        let stream = match tokio::time::timeout(self.connect_timeout, socket.connect(addr.into()))
            .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                self.logger
                    .error(&format!("Connection failed to {addr}: {e}"));
                return Err(NetworkError::socket("connect", e));
            }
            Err(_) => {
                let timeout_ms = self.connect_timeout.as_millis() as u64;
                self.logger
                    .error(&format!("Connection to {addr} timed out after {timeout_ms}ms"));
                return Err(NetworkError::ConnectTimeout {
                    addr: addr.to_string(),
                    timeout_ms,
                });
            }
        };

        if let Err(e) = self.peers.insert(Peer::connected(stream, addr)) {
            self.logger.error(&format!("Memory allocation failed: {e}"));
            return Err(e);
        }

        self.logger
            .info(&format!("Successfully connected to new peer {addr}"));
        Ok(())
    }

    /// Close and forget the first peer registered as exactly `address:port`.
    ///
    /// An unknown peer is not an error: nothing happens and nothing is
    /// logged.
    pub fn disconnect_from_peer(&mut self, address: &str, port: u16) {
        if let Some(peer) = self.peers.remove_first(address, port) {
            let addr = peer.addr();
            drop(peer);
            self.logger.info(&format!("Peer disconnected {addr}"));
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Address the listening socket is actually bound to.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    pub fn min_peers(&self) -> usize {
        self.min_peers
    }

    pub fn max_peers(&self) -> usize {
        self.max_peers
    }

    /// Stored for future liveness checks; no operation consults it yet.
    pub fn ping_timeout(&self) -> Duration {
        self.ping_timeout
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Seeds copied from the configuration. Never dialed by the node.
    pub fn seeds(&self) -> &[SeedNode] {
        &self.seeds
    }

    /// Number of connected peers in the registry.
    pub fn peer_count(&self) -> usize {
        self.peers.connected_count()
    }

    pub fn peer_addrs(&self) -> Vec<SocketAddrV4> {
        self.peers.addrs().collect()
    }

    fn release(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        drop(listener);

        let closed = self.peers.drain().count();
        self.seeds = Vec::new();

        self.logger.debug(&format!(
            "Node {}:{} destroyed, closed {closed} peer connection(s)",
            self.address, self.port
        ));
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("address", &self.address)
            .field("port", &self.port)
            .field("max_peers", &self.max_peers)
            .field("peers", &self.peers.len())
            .field("listening", &self.listener.is_some())
            .finish()
    }
}

fn non_zero_or<T: PartialEq + Default>(value: T, default: T) -> T {
    if value == T::default() {
        default
    } else {
        value
    }
}

/// Copy the caller's seed list. If room for the copy cannot be allocated
/// the node is still built, just without seeds.
fn copy_seeds(seeds: &[SeedNode], logger: &Logger) -> Vec<SeedNode> {
    let mut copy = Vec::new();
    if seeds.is_empty() {
        return copy;
    }
    match copy.try_reserve_exact(seeds.len()) {
        Ok(()) => copy.extend_from_slice(seeds),
        Err(e) => logger.warn(&format!("Could not copy {} seed(s): {e}", seeds.len())),
    }
    copy
}

fn log_socket_err<'a>(
    logger: &'a Logger,
    op: &'static str,
    message: &'a str,
) -> impl FnOnce(io::Error) -> NetworkError + 'a {
    move |e| {
        logger.error(&format!("{message}: {e}"));
        NetworkError::socket(op, e)
    }
}

/// socket -> SO_REUSEADDR -> parse -> bind -> listen(backlog). Each step is a
/// gate; the socket is closed on drop if a later step fails.
fn bind_listener(
    address: &str,
    port: u16,
    backlog: usize,
    logger: &Logger,
) -> Result<TcpListener, NetworkError> {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
        .map_err(log_socket_err(logger, "socket", "Failed to create server socket"))?;

    socket
        .set_reuse_address(true)
        .map_err(log_socket_err(logger, "setsockopt", "Failed to set socket options"))?;

    let Ok(ip) = address.parse::<Ipv4Addr>() else {
        logger.error(&format!("Invalid address: {address:?}"));
        return Err(NetworkError::InvalidAddress(address.to_string()));
    };

    socket
        .bind(&SocketAddrV4::new(ip, port).into())
        .map_err(log_socket_err(logger, "bind", "Bind failed"))?;

    let backlog = i32::try_from(backlog).unwrap_or(i32::MAX);
    socket
        .listen(backlog)
        .map_err(log_socket_err(logger, "listen", "Listen failed"))?;

    socket
        .set_nonblocking(true)
        .map_err(log_socket_err(logger, "setsockopt", "Failed to set socket options"))?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener).map_err(log_socket_err(
        logger,
        "register",
        "Failed to register server socket",
    ))
}
