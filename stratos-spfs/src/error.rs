use stratos_ipfs::IpfsError;
use thiserror::Error;

use crate::infrastructure::crypto::symmetric::CryptoError;

/// Errors surfaced by [`SpfsClient`](crate::SpfsClient).
///
/// Network and gateway failures, integrity failures and local configuration
/// mistakes are separate variants since each calls for a different fix.
#[derive(Debug, Error)]
pub enum SpfsError {
    /// Transport, gateway status, unknown content or closed client
    #[error(transparent)]
    Gateway(IpfsError),

    /// The downloaded bytes did not authenticate under the supplied key
    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Malformed key, base URL or request argument
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

pub type SpfsResult<T> = Result<T, SpfsError>;

impl SpfsError {
    pub fn is_retryable(&self) -> bool {
        match self {
            SpfsError::Gateway(err) => err.is_retryable(),
            _ => false,
        }
    }

    pub fn as_gateway(&self) -> Option<&IpfsError> {
        match self {
            SpfsError::Gateway(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IpfsError> for SpfsError {
    fn from(err: IpfsError) -> Self {
        match err {
            IpfsError::Configuration(msg) => SpfsError::Configuration(msg),
            other => SpfsError::Gateway(other),
        }
    }
}

impl From<CryptoError> for SpfsError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::DecryptingError
            | CryptoError::InvalidFormat(_)
            | CryptoError::UnsupportedVersion(_) => SpfsError::Decryption(err.to_string()),
            CryptoError::EncryptingError | CryptoError::NonceGenerationError(_) => {
                SpfsError::Encryption(err.to_string())
            }
        }
    }
}
