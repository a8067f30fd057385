//! Shared test utilities for gateway integration tests.
//!
//! Available behind the `test-util` feature. [`MockGateway`] serves the
//! `add` and `cat` endpoints of the IPFS HTTP API on an ephemeral localhost
//! port, addressing content by SHA-256 the same way [`MemoryContentStore`]
//! does.
//!
//! [`MemoryContentStore`]: crate::MemoryContentStore

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::infrastructure::config::ClientConfig;
use crate::infrastructure::repository::content_id;

/// Initialise a tracing subscriber for tests.
///
/// Respects `RUST_LOG`, defaults to `debug`. Safe to call multiple times.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Multipart upload as the gateway received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedUpload {
    pub field: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Default)]
struct GatewayState {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    uploads: RwLock<Vec<ReceivedUpload>>,
    failure: RwLock<Option<(StatusCode, String)>>,
    delay: RwLock<Option<Duration>>,
}

impl GatewayState {
    fn failure(&self) -> Option<(StatusCode, String)> {
        self.failure.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    async fn pause(&self) {
        let delay = *self.delay.read().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn kubo_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "Message": message, "Code": 0, "Type": "error" })),
    )
        .into_response()
}

async fn add(State(state): State<Arc<GatewayState>>, mut multipart: Multipart) -> Response {
    state.pause().await;
    if let Some((status, body)) = state.failure() {
        return (status, body).into_response();
    }

    let mut added = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return kubo_error(StatusCode::BAD_REQUEST, &err.to_string()),
        };

        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let data = match field.bytes().await {
            Ok(data) => data.to_vec(),
            Err(err) => return kubo_error(StatusCode::BAD_REQUEST, &err.to_string()),
        };

        state
            .uploads
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(ReceivedUpload {
                field: name.clone(),
                filename: filename.clone(),
                content_type,
                size: data.len(),
            });

        if name == "file" {
            let cid = content_id(&data);
            let size = data.len();
            state
                .blobs
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .insert(cid.clone(), data);
            added = Some(json!({
                "Name": filename.unwrap_or_default(),
                "Hash": cid,
                "Size": size.to_string(),
            }));
        }
    }

    match added {
        Some(descriptor) => Json(descriptor).into_response(),
        None => kubo_error(StatusCode::BAD_REQUEST, "file argument 'path' is required"),
    }
}

#[derive(Debug, Deserialize)]
struct CatParams {
    arg: String,
}

async fn cat(State(state): State<Arc<GatewayState>>, Query(params): Query<CatParams>) -> Response {
    state.pause().await;
    if let Some((status, body)) = state.failure() {
        return (status, body).into_response();
    }

    let blob = state
        .blobs
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(&params.arg)
        .cloned();

    match blob {
        Some(data) => (
            StatusCode::OK,
            [("content-type", "text/plain")],
            data,
        )
            .into_response(),
        None => kubo_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "block was not found locally (offline)",
        ),
    }
}

/// Kubo-compatible `add`/`cat` gateway bound to `127.0.0.1:0`.
///
/// The server shuts down when the gateway is dropped.
pub struct MockGateway {
    addr: SocketAddr,
    state: Arc<GatewayState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockGateway {
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(GatewayState::default());
        let router = Router::new()
            .route("/api/v0/add", post(add))
            .route("/api/v0/cat", post(cat))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown, signal) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async {
                let _ = signal.await;
            });
            if let Err(err) = server.await {
                tracing::warn!("mock gateway stopped: {err}");
            }
        });

        Ok(Self {
            addr,
            state,
            shutdown: Some(shutdown),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api/v0", self.addr)
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url())
    }

    /// Bytes as the gateway stored them.
    pub fn stored(&self, cid: &str) -> Option<Vec<u8>> {
        self.state
            .blobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(cid)
            .cloned()
    }

    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.state
            .uploads
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Answer every following request with `status` and `body`.
    pub fn fail_with(&self, status: u16, body: impl Into<String>) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        *self.state.failure.write().unwrap_or_else(|e| e.into_inner()) =
            Some((status, body.into()));
    }

    pub fn recover(&self) {
        *self.state.failure.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Hold every following response for `delay`.
    pub fn delay_responses(&self, delay: Duration) {
        *self.state.delay.write().unwrap_or_else(|e| e.into_inner()) = Some(delay);
    }
}

impl Drop for MockGateway {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}
