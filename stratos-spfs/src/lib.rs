//! Client for the Stratos SPFS gateway with optional client-side encryption.
//!
//! Content is encrypted with AES-256-GCM before it leaves the process and
//! decrypted after it comes back, so the gateway only ever stores ciphertext
//! when a key is used. Keys are passed per call:
//!
//! ```no_run
//! use stratos_spfs::{AddOptions, CatOptions, EncryptionKey, SpfsClient};
//!
//! # async fn run() -> Result<(), stratos_spfs::SpfsError> {
//! let client = SpfsClient::public_gateway()?;
//! let key = EncryptionKey::from_bytes([7u8; 32]);
//!
//! let descriptor = client
//!     .add(b"hello".to_vec(), AddOptions::new().encryption_key(&key))
//!     .await?;
//! let content = client
//!     .cat(descriptor.cid(), CatOptions::new().encryption_key(&key))
//!     .await?;
//! assert_eq!(content, b"hello");
//!
//! client.close().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use client::{AddOptions, CatOptions, SpfsClient};
pub use domain::{EncryptionKey, KEY_LEN};
pub use error::{SpfsError, SpfsResult};

pub use stratos_ipfs::{ClientConfig, ContentDescriptor, ContentStore, IpfsClient, IpfsError};
