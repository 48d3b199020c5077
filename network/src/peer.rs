//! Peer records and the registry that owns them.
//!
//! A [`Peer`] owns exactly one established outbound connection. Dropping the
//! peer drops the connection handle, which closes it; there is no separate
//! close call to forget or repeat.

use std::net::SocketAddrV4;

use crate::NetworkError;

/// One established outbound connection.
#[derive(Debug)]
pub struct Peer<S> {
    stream: S,
    addr: SocketAddrV4,
    connected: bool,
}

impl<S> Peer<S> {
    /// Wrap a freshly connected stream. Peers are never stored half-open.
    pub fn connected(stream: S, addr: SocketAddrV4) -> Self {
        Self {
            stream,
            addr,
            connected: true,
        }
    }

    pub fn addr(&self) -> SocketAddrV4 {
        self.addr
    }

    /// Exact match on the textual IPv4 address and the port.
    pub fn matches(&self, address: &str, port: u16) -> bool {
        self.addr.port() == port && self.addr.ip().to_string() == address
    }

    pub fn into_stream(self) -> S {
        self.stream
    }
}

/// Unordered collection of [`Peer`]s owned by a node.
///
/// Insertion is O(1) amortised, removal is a single linear pass that stops
/// at the first match. No ordering is guaranteed between peers.
#[derive(Debug)]
pub struct PeerRegistry<S> {
    peers: Vec<Peer<S>>,
}

impl<S> PeerRegistry<S> {
    pub fn new() -> Self {
        Self { peers: Vec::new() }
    }

    /// Store a peer. Fails without touching the registry if room for one
    /// more record cannot be allocated. A rejected peer is dropped, which
    /// closes its connection.
    pub fn insert(&mut self, peer: Peer<S>) -> Result<(), NetworkError> {
        self.peers.try_reserve(1).map_err(|e| {
            NetworkError::ResourceExhausted(format!("peer record for {}: {e}", peer.addr))
        })?;
        self.peers.push(peer);
        Ok(())
    }

    /// Unlink and return the first peer matching `address:port`.
    pub fn remove_first(&mut self, address: &str, port: u16) -> Option<Peer<S>> {
        let index = self.peers.iter().position(|p| p.matches(address, port))?;
        Some(self.peers.swap_remove(index))
    }

    /// Number of peers whose connected flag is set.
    pub fn connected_count(&self) -> usize {
        self.peers.iter().filter(|p| p.connected).count()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn addrs(&self) -> impl Iterator<Item = SocketAddrV4> + '_ {
        self.peers.iter().map(|p| p.addr)
    }

    /// Remove every peer regardless of its connected flag.
    pub fn drain(&mut self) -> impl Iterator<Item = Peer<S>> + '_ {
        self.peers.drain(..)
    }
}

impl<S> Default for PeerRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
