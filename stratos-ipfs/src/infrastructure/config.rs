//! Configuration for the gateway client

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use url::Url;

/// Public Stratos SPFS gateway speaking the IPFS HTTP API.
pub const SPFS_PUBLIC_GATEWAY: &str =
    "https://sds-gateway-uswest.thestratos.org/spfs/PSu46EiNUYevTVA8doNHiCAFrxU=/api/v0";

/// HTTP API of a local IPFS (Kubo) node.
pub const LOCAL_IPFS_API: &str = "http://127.0.0.1:5001/api/v0";

/// Client configuration.
///
/// `timeout_ms` is applied uniformly to every request. Leaving it unset means
/// requests never time out on the client side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Gateway API base URL, e.g. `http://127.0.0.1:5001/api/v0`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request deadline in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// User-Agent header sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: None,
            user_agent: None,
        }
    }
}

fn default_base_url() -> String {
    SPFS_PUBLIC_GATEWAY.to_string()
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Configuration pointing at a local IPFS node.
    pub fn local_ipfs() -> Self {
        Self::new(LOCAL_IPFS_API)
    }

    /// Sub-millisecond deadlines round up to 1 ms; only `Duration::ZERO`
    /// stores 0.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.timeout_ms = Some(millis.min(u64::MAX as u128) as u64);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))
    }

    /// Check the configuration and return the parsed base URL.
    pub fn validate(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(self.base_url.trim())
            .map_err(|e| ConfigError::InvalidBaseUrl(format!("{}: {e}", self.base_url)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidBaseUrl(format!(
                "unsupported scheme `{}` in {}",
                url.scheme(),
                self.base_url
            )));
        }

        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(ConfigError::InvalidBaseUrl(format!(
                "{} has no host",
                self.base_url
            )));
        }

        if self.timeout_ms == Some(0) {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(url)
    }

    /// Full URL of a gateway operation such as `add` or `cat`.
    pub fn endpoint(&self, operation: &str) -> String {
        format!("{}/{}", self.base_url.trim().trim_end_matches('/'), operation)
    }
}

/// Configuration error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidBaseUrl(String),
    InvalidTimeout,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(msg) => write!(f, "IO error: {msg}"),
            ConfigError::ParseError(msg) => write!(f, "Parse error: {msg}"),
            ConfigError::SerializeError(msg) => write!(f, "Serialize error: {msg}"),
            ConfigError::InvalidBaseUrl(msg) => write!(f, "Invalid base URL: {msg}"),
            ConfigError::InvalidTimeout => write!(f, "Timeout must be greater than zero"),
        }
    }
}

impl std::error::Error for ConfigError {}
