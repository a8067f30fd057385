pub mod client;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod filename;
pub mod repository;

pub use client::IpfsClient;
pub use config::{ClientConfig, ConfigError};
pub use descriptor::ContentDescriptor;
pub use error::{IpfsError, IpfsResult, TransportErrorKind};
pub use repository::MemoryContentStore;

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};

/// add/cat capability shared by the gateway client and its decorators.
#[async_trait::async_trait]
pub trait ContentStore: Send + Sync {
    /// Store `data` and return the descriptor the store assigned to it.
    async fn add(&self, data: Vec<u8>, filename: Option<&str>) -> IpfsResult<ContentDescriptor>;

    /// Fetch the exact bytes previously stored under `cid`.
    async fn cat(&self, cid: &str) -> IpfsResult<Vec<u8>>;

    /// Release held resources. Calling it more than once is a no-op.
    async fn close(&self);
}

#[async_trait::async_trait]
impl<S: ContentStore + ?Sized> ContentStore for Arc<S> {
    async fn add(&self, data: Vec<u8>, filename: Option<&str>) -> IpfsResult<ContentDescriptor> {
        (**self).add(data, filename).await
    }

    async fn cat(&self, cid: &str) -> IpfsResult<Vec<u8>> {
        (**self).cat(cid).await
    }

    async fn close(&self) {
        (**self).close().await
    }
}

/// Drain a stream payload into memory.
pub async fn read_payload<R>(mut reader: R) -> IpfsResult<Vec<u8>>
where
    R: AsyncRead + Unpin + Send,
{
    let mut data = Vec::new();
    reader
        .read_to_end(&mut data)
        .await
        .map_err(IpfsError::Payload)?;
    Ok(data)
}

pub(crate) fn ensure_cid(cid: &str) -> IpfsResult<()> {
    if cid.trim().is_empty() {
        return Err(IpfsError::Configuration(
            "content identifier must not be empty".into(),
        ));
    }
    Ok(())
}
