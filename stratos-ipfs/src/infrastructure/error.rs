use std::fmt;

use thiserror::Error;

use super::config::ConfigError;

/// What part of the transport failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, DNS failure, TLS handshake failure
    Connect,
    /// The per-request deadline elapsed
    Timeout,
    /// The request could not be sent
    Request,
    /// The response body could not be read
    Body,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Connect => write!(f, "connect"),
            TransportErrorKind::Timeout => write!(f, "timeout"),
            TransportErrorKind::Request => write!(f, "request"),
            TransportErrorKind::Body => write!(f, "body"),
        }
    }
}

#[derive(Debug, Error)]
pub enum IpfsError {
    #[error("transport {kind} error: {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    #[error("gateway responded with status {status}: {body}")]
    GatewayRequest { status: u16, body: String },

    #[error("content not found: {0}")]
    NotFound(String),

    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("failed to read payload: {0}")]
    Payload(#[source] std::io::Error),

    #[error("client is closed")]
    Closed,
}

pub type IpfsResult<T> = Result<T, IpfsError>;

impl IpfsError {
    /// Whether retrying the same call may succeed. No retries happen internally.
    pub fn is_retryable(&self) -> bool {
        match self {
            IpfsError::Transport { .. } => true,
            IpfsError::GatewayRequest { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            IpfsError::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for IpfsError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Request
        };

        IpfsError::Transport {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<ConfigError> for IpfsError {
    fn from(err: ConfigError) -> Self {
        IpfsError::Configuration(err.to_string())
    }
}
