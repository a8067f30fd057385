use std::future::Future;
use std::sync::{Arc, RwLock};

use reqwest::{multipart, Client, Response, StatusCode};
use serde::Deserialize;
use tokio::io::AsyncRead;
use tracing::{debug, warn};

use super::config::ClientConfig;
use super::descriptor::ContentDescriptor;
use super::error::{IpfsError, IpfsResult};
use super::filename::resolve_filename;
use super::{ensure_cid, read_payload, ContentStore};

const OCTET_STREAM: &str = "application/octet-stream";

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Error body returned by Kubo-compatible gateways.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GatewayErrorBody {
    message: String,
}

fn reports_not_found(body: &str) -> bool {
    serde_json::from_str::<GatewayErrorBody>(body)
        .map(|err| err.message.to_ascii_lowercase().contains("not found"))
        .unwrap_or(false)
}

/// Client for the IPFS `add`/`cat` HTTP API.
///
/// The connection pool lives until [`IpfsClient::close`] is called or the
/// client is dropped. Requests issued after `close` fail with
/// [`IpfsError::Closed`].
#[derive(Debug)]
pub struct IpfsClient {
    config: ClientConfig,
    http_client: RwLock<Option<Client>>,
}

impl IpfsClient {
    pub fn new(config: ClientConfig) -> IpfsResult<Self> {
        config.validate()?;

        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(default_user_agent);
        let mut builder = Client::builder().user_agent(user_agent);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(|err| {
            IpfsError::Configuration(format!("failed to create HTTP client: {err}"))
        })?;

        debug!(base_url = %config.base_url, timeout = ?config.timeout(), "created gateway client");

        Ok(Self {
            config,
            http_client: RwLock::new(Some(http_client)),
        })
    }

    /// Client for a local IPFS node.
    pub fn local() -> IpfsResult<Self> {
        Self::new(ClientConfig::local_ipfs())
    }

    /// Run `body` with a fresh client and close it afterwards, whatever the
    /// outcome of `body`.
    pub async fn scope<T, E, F, Fut>(config: ClientConfig, body: F) -> Result<T, E>
    where
        F: FnOnce(Arc<IpfsClient>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<IpfsError>,
    {
        let client = Arc::new(Self::new(config)?);
        let outcome = body(Arc::clone(&client)).await;
        Self::close(&client).await;
        outcome
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn is_closed(&self) -> bool {
        self.http_client
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_none()
    }

    fn http(&self) -> IpfsResult<Client> {
        self.http_client
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(IpfsError::Closed)
    }

    /// Upload `data` as a single multipart file field named `file`.
    pub async fn add(
        &self,
        data: impl Into<Vec<u8>>,
        filename: Option<&str>,
    ) -> IpfsResult<ContentDescriptor> {
        let http = self.http()?;
        let data = data.into();
        let size = data.len();
        let filename = resolve_filename(filename);

        let part = multipart::Part::bytes(data)
            .file_name(filename.clone())
            .mime_str(OCTET_STREAM)?;
        let form = multipart::Form::new().part("file", part);

        let resp = http
            .post(self.config.endpoint("add"))
            .multipart(form)
            .send()
            .await?;
        let resp = Self::check_status(resp, None).await?;

        let body = resp.text().await?;
        let descriptor = ContentDescriptor::from_response_body(&body)?;
        debug!(cid = descriptor.cid(), %filename, size, "added content");

        Ok(descriptor)
    }

    /// Read a stream to exhaustion and upload it.
    pub async fn add_reader<R>(
        &self,
        reader: R,
        filename: Option<&str>,
    ) -> IpfsResult<ContentDescriptor>
    where
        R: AsyncRead + Unpin + Send,
    {
        let data = read_payload(reader).await?;
        self.add(data, filename).await
    }

    /// Fetch the raw bytes stored under `cid`.
    pub async fn cat(&self, cid: &str) -> IpfsResult<Vec<u8>> {
        ensure_cid(cid)?;
        let http = self.http()?;

        let resp = http
            .post(self.config.endpoint("cat"))
            .query(&[("arg", cid)])
            .send()
            .await?;
        let resp = Self::check_status(resp, Some(cid)).await?;

        let bytes = resp.bytes().await?;
        debug!(cid, size = bytes.len(), "fetched content");

        Ok(bytes.to_vec())
    }

    /// Release the connection pool. Idempotent.
    pub async fn close(&self) {
        let released = self
            .http_client
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if released.is_some() {
            debug!(base_url = %self.config.base_url, "closed gateway client");
        }
    }

    async fn check_status(resp: Response, cid: Option<&str>) -> IpfsResult<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        // the status alone still classifies the failure
        let body = match resp.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(status = status.as_u16(), "failed to read gateway error body: {err}");
                String::new()
            }
        };
        warn!(status = status.as_u16(), cid, "gateway request failed");

        if let Some(cid) = cid {
            if status == StatusCode::NOT_FOUND || reports_not_found(&body) {
                return Err(IpfsError::NotFound(cid.to_string()));
            }
        }

        Err(IpfsError::GatewayRequest {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait::async_trait]
impl ContentStore for IpfsClient {
    async fn add(&self, data: Vec<u8>, filename: Option<&str>) -> IpfsResult<ContentDescriptor> {
        IpfsClient::add(self, data, filename).await
    }

    async fn cat(&self, cid: &str) -> IpfsResult<Vec<u8>> {
        IpfsClient::cat(self, cid).await
    }

    async fn close(&self) {
        IpfsClient::close(self).await
    }
}
