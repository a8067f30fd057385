use crate::domain::EncryptionKey;
use crate::infrastructure::crypto::symmetric::nonce::{NonceError, NonceGenerator, NONCE_LEN};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use thiserror::Error;

/// First byte of every envelope.
pub const ENVELOPE_VERSION: u8 = 0x01;
pub const TAG_LEN: usize = 16;
/// version + nonce
pub const HEADER_LEN: usize = 1 + NONCE_LEN;

pub trait SymmetricEncryption {
    /// Encrypt `data` into a self-contained envelope
    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Authenticate and decrypt an envelope produced by `encrypt`
    fn decrypt(&self, envelope: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("cipher rejected the plaintext")]
    EncryptingError,
    #[error("authentication failed: wrong key or corrupted data")]
    DecryptingError,
    #[error("data is too short to be an encrypted envelope ({0} bytes)")]
    InvalidFormat(usize),
    #[error("unsupported envelope version {0:#04x}")]
    UnsupportedVersion(u8),
    #[error(transparent)]
    NonceGenerationError(#[from] NonceError),
}

/// AES-256-GCM over `version || nonce || ciphertext || tag`.
pub struct AesCipher<'a> {
    key: &'a EncryptionKey,
    nonce_generator: &'a NonceGenerator,
}

impl<'a> AesCipher<'a> {
    pub fn new(key: &'a EncryptionKey, nonce_generator: &'a NonceGenerator) -> Self {
        Self {
            key,
            nonce_generator,
        }
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.key.as_bytes()))
    }
}

impl SymmetricEncryption for AesCipher<'_> {
    fn encrypt(&self, target: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let nonce_bytes = self.nonce_generator.generate()?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let encrypted_data = self
            .cipher()
            .encrypt(nonce, target)
            .map_err(|_| CryptoError::EncryptingError)?;

        let mut result = Vec::with_capacity(HEADER_LEN + encrypted_data.len());
        result.push(ENVELOPE_VERSION);
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&encrypted_data);
        Ok(result)
    }

    fn decrypt(&self, envelope: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if envelope.len() < HEADER_LEN + TAG_LEN {
            return Err(CryptoError::InvalidFormat(envelope.len()));
        }
        if envelope[0] != ENVELOPE_VERSION {
            return Err(CryptoError::UnsupportedVersion(envelope[0]));
        }

        let nonce = Nonce::from_slice(&envelope[1..HEADER_LEN]);
        self.cipher()
            .decrypt(nonce, &envelope[HEADER_LEN..])
            .map_err(|_| CryptoError::DecryptingError)
    }
}
