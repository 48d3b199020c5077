//! Node construction parameters with TOML file support.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::logger::Logger;
use crate::NetworkError;

pub const DEFAULT_MIN_PEERS: usize = 3;
pub const DEFAULT_MAX_PEERS: usize = 5;
pub const DEFAULT_PING_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// A known remote node recorded for later use. Never dialed by the node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedNode {
    pub address: String,
    pub port: u16,
}

impl SeedNode {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }
}

impl fmt::Display for SeedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

impl std::str::FromStr for SeedNode {
    type Err = NetworkError;

    /// Parse `"ip:port"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, port) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| NetworkError::Config(format!("expected ip:port, got {s:?}")))?;
        let port = port
            .parse::<u16>()
            .map_err(|e| NetworkError::Config(format!("bad port in {s:?}: {e}")))?;
        Ok(Self::new(address, port))
    }
}

/// Everything [`Node::create`](crate::Node::create) needs.
///
/// A zero `min_peers`, `max_peers`, `ping_timeout_ms` or `connect_timeout_ms`
/// means "use the default". The node copies what it needs out of the config;
/// nothing here is retained by reference.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// IPv4 address the listening socket binds to.
    #[serde(default = "default_address")]
    pub address: String,

    /// Port the listening socket binds to. Must be non-zero.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Advisory lower bound on peer count. Stored, never enforced.
    #[serde(default = "default_min_peers")]
    pub min_peers: usize,

    /// Hard cap on concurrent outbound peers; also the listen backlog.
    #[serde(default = "default_max_peers")]
    pub max_peers: usize,

    /// Stored, currently unused by any operation.
    #[serde(default = "default_ping_timeout_ms")]
    pub ping_timeout_ms: u64,

    /// Upper bound on a single outbound connect attempt.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Known remote nodes. Copied at construction, never dialed.
    #[serde(default)]
    pub seeds: Vec<SeedNode>,

    /// Diagnostics sink. `None`, or a logger without an info slot, means
    /// the no-op logger.
    #[serde(skip)]
    pub logger: Option<Logger>,
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_min_peers() -> usize {
    DEFAULT_MIN_PEERS
}

fn default_max_peers() -> usize {
    DEFAULT_MAX_PEERS
}

fn default_ping_timeout_ms() -> u64 {
    DEFAULT_PING_TIMEOUT_MS
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

impl NodeConfig {
    /// Config for `address:port` with every other field at its default.
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_max_peers(mut self, max_peers: usize) -> Self {
        self.max_peers = max_peers;
        self
    }

    pub fn with_seeds(mut self, seeds: Vec<SeedNode>) -> Self {
        self.seeds = seeds;
        self
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, NetworkError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| NetworkError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NetworkError> {
        toml::from_str(s).map_err(|e| NetworkError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string. The logger is omitted.
    pub fn to_toml_string(&self) -> Result<String, NetworkError> {
        toml::to_string_pretty(self).map_err(|e| NetworkError::Config(e.to_string()))
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            min_peers: default_min_peers(),
            max_peers: default_max_peers(),
            ping_timeout_ms: default_ping_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            seeds: Vec::new(),
            logger: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.address, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.min_peers, 3);
        assert_eq!(config.max_peers, 5);
        assert_eq!(config.ping_timeout_ms, 3000);
        assert!(config.seeds.is_empty());
        assert!(config.logger.is_none());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            port = 9001
            max_peers = 1

            [[seeds]]
            address = "10.0.0.1"
            port = 7000
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.port, 9001);
        assert_eq!(config.max_peers, 1);
        assert_eq!(config.min_peers, 3);
        assert_eq!(config.seeds, vec![SeedNode::new("10.0.0.1", 7000)]);
    }

    #[test]
    fn toml_round_trip_drops_logger() {
        let config = NodeConfig::new("0.0.0.0", 9100)
            .with_seeds(vec![SeedNode::new("1.2.3.4", 1)])
            .with_logger(Logger::noop());
        let text = config.to_toml_string().expect("serializable");
        let parsed = NodeConfig::from_toml_str(&text).expect("should parse");
        assert_eq!(parsed.address, "0.0.0.0");
        assert_eq!(parsed.seeds, config.seeds);
        assert!(parsed.logger.is_none());
    }

    #[test]
    fn negative_port_is_rejected_by_parser() {
        let err = NodeConfig::from_toml_str("port = -1").unwrap_err();
        assert!(matches!(err, NetworkError::Config(_)));
    }

    #[test]
    fn loads_config_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "address = \"0.0.0.0\"\nport = 9100\nmax_peers = 2\n\n[[seeds]]\naddress = \"10.0.0.7\"\nport = 7075"
        )
        .expect("write config");

        let config = NodeConfig::from_toml_file(file.path()).expect("should load");
        assert_eq!(config.address, "0.0.0.0");
        assert_eq!(config.port, 9100);
        assert_eq!(config.max_peers, 2);
        assert_eq!(config.ping_timeout_ms, 3000);
        assert_eq!(config.seeds, vec![SeedNode::new("10.0.0.7", 7075)]);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/peerlink.toml");
        assert!(matches!(result, Err(NetworkError::Config(_))));
    }

    #[test]
    fn seed_parses_from_ip_port() {
        let seed: SeedNode = "192.168.1.10:7075".parse().unwrap();
        assert_eq!(seed, SeedNode::new("192.168.1.10", 7075));
        assert_eq!(seed.to_string(), "192.168.1.10:7075");
        assert!("no-port".parse::<SeedNode>().is_err());
        assert!("1.2.3.4:99999".parse::<SeedNode>().is_err());
    }
}
