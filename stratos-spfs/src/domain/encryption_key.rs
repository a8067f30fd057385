use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine as _;

use crate::error::{SpfsError, SpfsResult};

pub const KEY_LEN: usize = 32;

/// Caller-supplied 256-bit content encryption key.
///
/// The key is never generated, persisted or logged here. Its `Debug` output
/// is redacted and the material is zeroed on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes; anything but exactly 32 bytes is rejected.
    pub fn from_slice(bytes: &[u8]) -> SpfsResult<Self> {
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            SpfsError::Configuration(format!(
                "encryption key must be {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(key))
    }

    /// URL-safe base64 token form of the key, padded or not.
    pub fn from_base64url(token: &str) -> SpfsResult<Self> {
        let token = token.trim();
        let decoded = URL_SAFE
            .decode(token)
            .or_else(|_| URL_SAFE_NO_PAD.decode(token))
            .map_err(|e| {
                SpfsError::Configuration(format!("encryption key is not URL-safe base64: {e}"))
            })?;
        Self::from_slice(&decoded)
    }

    pub fn to_base64url(&self) -> String {
        URL_SAFE.encode(self.0)
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl TryFrom<&[u8]> for EncryptionKey {
    type Error = SpfsError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}

impl From<[u8; KEY_LEN]> for EncryptionKey {
    fn from(bytes: [u8; KEY_LEN]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl FromStr for EncryptionKey {
    type Err = SpfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base64url(s)
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

impl Drop for EncryptionKey {
    fn drop(&mut self) {
        for byte in self.0.iter_mut() {
            *byte = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_requires_32_bytes() {
        assert!(EncryptionKey::from_slice(&[7u8; 32]).is_ok());

        for len in [0usize, 16, 29, 31, 33, 64] {
            let result = EncryptionKey::from_slice(&vec![1u8; len]);
            assert!(
                matches!(result, Err(SpfsError::Configuration(_))),
                "{len} byte key should be rejected"
            );
        }
    }

    #[test]
    fn test_base64url_token() {
        let key = EncryptionKey::from_bytes([0xfb; 32]);
        let token = key.to_base64url();
        assert_eq!(token.len(), 44);
        assert!(!token.contains('+') && !token.contains('/'));

        assert_eq!(EncryptionKey::from_base64url(&token).unwrap(), key);
        assert_eq!(token.parse::<EncryptionKey>().unwrap(), key);

        let unpadded = token.trim_end_matches('=');
        assert_eq!(EncryptionKey::from_base64url(unpadded).unwrap(), key);
    }

    #[test]
    fn test_base64url_rejects_malformed_tokens() {
        assert!(matches!(
            EncryptionKey::from_base64url("not base64 at all!"),
            Err(SpfsError::Configuration(_))
        ));
        // valid base64 but only 16 bytes of key material
        assert!(matches!(
            EncryptionKey::from_base64url(&URL_SAFE.encode([1u8; 16])),
            Err(SpfsError::Configuration(_))
        ));
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = EncryptionKey::from_bytes([0x41; 32]);
        let debug = format!("{key:?}");
        assert_eq!(debug, "EncryptionKey(<redacted>)");
        assert!(!debug.contains("41"));
    }
}
