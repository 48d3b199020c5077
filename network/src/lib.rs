//! Peer lifecycle core for a minimal peer-to-peer node.
//!
//! A [`Node`] binds and listens at construction, then tracks a bounded set
//! of outbound peer connections driven entirely by the caller through
//! [`Node::connect_to_peer`] and [`Node::disconnect_from_peer`]. Diagnostics
//! go through the six-slot [`Logger`] facade.

pub mod config;
pub mod error;
pub mod logger;
pub mod node;
pub mod peer;

pub use config::{NodeConfig, SeedNode};
pub use error::NetworkError;
pub use logger::{create_default_logger, LogFn, LogLevel, Logger, LoggerBuilder};
pub use node::Node;
pub use peer::{Peer, PeerRegistry};
