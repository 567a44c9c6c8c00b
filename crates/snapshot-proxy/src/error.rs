//! Error types for the proxy chain and the snapshot cache.
//!
//! None of these reach the client: the controller maps every failure to the
//! safe 500 snapshot and reports the error through logs and metrics.

/// Errors raised by a [`crate::cache::CacheStore`].
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache entry {key} is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
    #[error("failed to encode cache entry: {0}")]
    Encode(String),
}

impl CacheError {
    pub fn kind(&self) -> &'static str {
        match self {
            CacheError::Io(_) => "io",
            CacheError::Corrupt { .. } => "corrupt",
            CacheError::Encode(_) => "encode",
        }
    }
}

/// Errors raised while proxying a single request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("invalid target URI '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },
    #[error("target host '{0}' is not in the allowed hosts list")]
    TargetNotAllowed(String),
    #[error("failed to read inbound request body: {0}")]
    InboundBody(String),
    #[error("failed to build upstream request: {0}")]
    Request(#[from] hyper::http::Error),
    #[error("failed to send request to upstream: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),
    #[error("failed to read upstream response body: {0}")]
    UpstreamBody(#[from] hyper::Error),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ProxyError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidTarget { .. } => "invalid_target",
            ProxyError::TargetNotAllowed(_) => "target_not_allowed",
            ProxyError::InboundBody(_) => "inbound_body",
            ProxyError::Request(_) => "request",
            ProxyError::Transport(e) if e.is_connect() => "connect",
            ProxyError::Transport(_) => "transport",
            ProxyError::UpstreamBody(_) => "upstream_body",
            ProxyError::Cache(_) => "cache",
        }
    }
}
