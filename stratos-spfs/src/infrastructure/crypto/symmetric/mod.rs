pub mod aes_cipher;
pub mod nonce;

pub use aes_cipher::{AesCipher, CryptoError, SymmetricEncryption};
pub use nonce::{NonceError, NonceGenerator};
