use std::future::Future;
use std::sync::Arc;

use stratos_ipfs::{
    read_payload, ClientConfig, ContentDescriptor, ContentStore, IpfsClient, IpfsResult,
};
use tokio::io::AsyncRead;
use tracing::{debug, warn};

use crate::domain::EncryptionKey;
use crate::error::SpfsResult;
use crate::infrastructure::crypto::symmetric::{AesCipher, NonceGenerator, SymmetricEncryption};

/// Per-call options for [`SpfsClient::add`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AddOptions<'a> {
    pub filename: Option<&'a str>,
    pub encryption_key: Option<&'a EncryptionKey>,
}

impl<'a> AddOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filename(mut self, filename: &'a str) -> Self {
        self.filename = Some(filename);
        self
    }

    pub fn encryption_key(mut self, key: &'a EncryptionKey) -> Self {
        self.encryption_key = Some(key);
        self
    }
}

/// Per-call options for [`SpfsClient::cat`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CatOptions<'a> {
    pub encryption_key: Option<&'a EncryptionKey>,
}

impl<'a> CatOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encryption_key(mut self, key: &'a EncryptionKey) -> Self {
        self.encryption_key = Some(key);
        self
    }
}

/// Content store client that optionally encrypts before upload and decrypts
/// after download.
///
/// The key is chosen per call, so one client can carry encrypted and plain
/// content side by side. Identifiers address the bytes actually stored, which
/// means ciphertext whenever a key was used; `cat` has to be given the same
/// key (or none) that the matching `add` used.
pub struct SpfsClient<S = IpfsClient> {
    store: S,
    nonce_generator: NonceGenerator,
}

impl SpfsClient<IpfsClient> {
    pub fn new(config: ClientConfig) -> SpfsResult<Self> {
        Ok(Self::with_store(IpfsClient::new(config)?))
    }

    /// Client for the public Stratos SPFS gateway.
    pub fn public_gateway() -> SpfsResult<Self> {
        Self::new(ClientConfig::default())
    }

    /// Run `body` with a fresh client and close it afterwards, whatever the
    /// outcome of `body`.
    pub async fn scope<T, E, F, Fut>(config: ClientConfig, body: F) -> Result<T, E>
    where
        F: FnOnce(Arc<Self>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<crate::SpfsError>,
    {
        let client = Arc::new(Self::new(config)?);
        let outcome = body(Arc::clone(&client)).await;
        Self::close(&client).await;
        outcome
    }
}

impl<S: ContentStore> SpfsClient<S> {
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            nonce_generator: NonceGenerator::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Store `payload`, encrypting it first when a key is given.
    ///
    /// The returned descriptor is the store's, unchanged.
    pub async fn add(
        &self,
        payload: impl Into<Vec<u8>>,
        options: AddOptions<'_>,
    ) -> SpfsResult<ContentDescriptor> {
        let payload = payload.into();
        let plaintext_len = payload.len();

        let outgoing = match options.encryption_key {
            Some(key) => AesCipher::new(key, &self.nonce_generator).encrypt(&payload)?,
            None => payload,
        };

        let descriptor = self.store.add(outgoing, options.filename).await?;
        debug!(
            cid = descriptor.cid(),
            encrypted = options.encryption_key.is_some(),
            plaintext_len,
            "stored content"
        );

        Ok(descriptor)
    }

    /// Read a stream to exhaustion, then behave like [`SpfsClient::add`].
    pub async fn add_reader<R>(
        &self,
        reader: R,
        options: AddOptions<'_>,
    ) -> SpfsResult<ContentDescriptor>
    where
        R: AsyncRead + Unpin + Send,
    {
        let payload = read_payload(reader).await?;
        self.add(payload, options).await
    }

    /// Fetch content, decrypting it when a key is given.
    ///
    /// With a key, anything that does not authenticate under it fails with
    /// [`SpfsError::Decryption`](crate::SpfsError::Decryption). Without a key
    /// the stored bytes come back untouched, ciphertext included.
    pub async fn cat(&self, cid: &str, options: CatOptions<'_>) -> SpfsResult<Vec<u8>> {
        let raw = self.store.cat(cid).await?;

        let Some(key) = options.encryption_key else {
            return Ok(raw);
        };

        AesCipher::new(key, &self.nonce_generator)
            .decrypt(&raw)
            .map_err(|err| {
                warn!(cid, "stored content did not decrypt: {err}");
                err.into()
            })
    }

    /// Close the underlying store. Idempotent.
    pub async fn close(&self) {
        self.store.close().await
    }
}

/// Keyless pass-through, so an `SpfsClient` can stand in wherever a
/// [`ContentStore`] is expected. Bytes go to and come from the wrapped store
/// unchanged.
#[async_trait::async_trait]
impl<S: ContentStore> ContentStore for SpfsClient<S> {
    async fn add(&self, data: Vec<u8>, filename: Option<&str>) -> IpfsResult<ContentDescriptor> {
        self.store.add(data, filename).await
    }

    async fn cat(&self, cid: &str) -> IpfsResult<Vec<u8>> {
        self.store.cat(cid).await
    }

    async fn close(&self) {
        self.store.close().await
    }
}
