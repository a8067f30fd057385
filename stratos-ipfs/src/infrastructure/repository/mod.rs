use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use sha2::{Digest, Sha256};

use super::descriptor::ContentDescriptor;
use super::error::{IpfsError, IpfsResult};
use super::filename::resolve_filename;
use super::{ensure_cid, ContentStore};

/// Identifier used by the in-memory store: hex SHA-256 of the stored bytes.
pub fn content_id(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// In-process content store, addressed by SHA-256.
pub struct MemoryContentStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    closed: AtomicBool,
}

impl Default for MemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Bytes exactly as they were handed to the store.
    pub fn stored(&self, cid: &str) -> Option<Vec<u8>> {
        self.blobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(cid)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> IpfsResult<()> {
        if self.is_closed() {
            return Err(IpfsError::Closed);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ContentStore for MemoryContentStore {
    async fn add(&self, data: Vec<u8>, filename: Option<&str>) -> IpfsResult<ContentDescriptor> {
        self.ensure_open()?;

        let cid = content_id(&data);
        let size = data.len() as u64;
        self.blobs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(cid.clone(), data);

        Ok(ContentDescriptor::new(
            cid,
            Some(resolve_filename(filename)),
            Some(size),
        ))
    }

    async fn cat(&self, cid: &str) -> IpfsResult<Vec<u8>> {
        ensure_cid(cid)?;
        self.ensure_open()?;

        self.stored(cid)
            .ok_or_else(|| IpfsError::NotFound(cid.to_string()))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
