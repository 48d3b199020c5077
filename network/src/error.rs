use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid IPv4 address: {0:?}")]
    InvalidAddress(String),

    #[error("{op} failed: {source}")]
    Socket {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("connection to {addr} timed out after {timeout_ms}ms")]
    ConnectTimeout { addr: String, timeout_ms: u64 },

    #[error("maximum peer limit reached ({max})")]
    PeerLimitReached { max: usize },

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("config error: {0}")]
    Config(String),
}

impl NetworkError {
    pub(crate) fn socket(op: &'static str, source: std::io::Error) -> Self {
        Self::Socket { op, source }
    }
}
