//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p shardbox-api --test upload_test`
//! or `cargo test -p shardbox-api`. The blob backend is an in-memory mock,
//! so no network is needed.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use bytes::Bytes;
use futures::stream;
use shardbox_api::setup::routes;
use shardbox_api::AppState;
use shardbox_core::Config;
use shardbox_storage::{
    BackendError, BackendResult, BlobBackend, ByteStream, ChunkRef, MemoryMetadataStore,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CHUNK_SIZE: u64 = 1024 * 1024;

/// In-memory blob backend. Objects live in a map keyed by generated ids;
/// `resolve` hands out `mock://` URLs that `fetch` understands. Rate-limit
/// pushback can be injected per-call to exercise the retry path.
pub struct MockBlobBackend {
    objects: Mutex<HashMap<String, Bytes>>,
    next_id: AtomicU64,
    upload_calls: AtomicU64,
    /// Pending rate-limit rejections, consumed one per upload attempt.
    rate_limits: Mutex<VecDeque<Duration>>,
    /// Size of the pieces `fetch` splits an object into, to exercise the
    /// byte-window slicing downstream.
    fetch_piece_size: usize,
}

impl MockBlobBackend {
    pub fn new() -> Self {
        MockBlobBackend {
            objects: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            upload_calls: AtomicU64::new(0),
            rate_limits: Mutex::new(VecDeque::new()),
            fetch_piece_size: 64 * 1024,
        }
    }

    /// Queue a rate-limit rejection for the next upload attempt.
    pub fn inject_rate_limit(&self, retry_after: Duration) {
        self.rate_limits.lock().unwrap().push_back(retry_after);
    }

    /// Total upload attempts, including rejected ones.
    pub fn upload_calls(&self) -> u64 {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobBackend for MockBlobBackend {
    async fn upload(&self, _object_name: &str, data: Bytes) -> BackendResult<ChunkRef> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(retry_after) = self.rate_limits.lock().unwrap().pop_front() {
            return Err(BackendError::RateLimited { retry_after });
        }
        let id = format!("obj-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.objects.lock().unwrap().insert(id.clone(), data);
        Ok(ChunkRef(id))
    }

    async fn resolve(&self, chunk_ref: &ChunkRef) -> BackendResult<Option<String>> {
        let known = self.objects.lock().unwrap().contains_key(chunk_ref.as_str());
        Ok(known.then(|| format!("mock://{}", chunk_ref)))
    }

    async fn fetch(&self, url: &str) -> BackendResult<ByteStream> {
        let id = url
            .strip_prefix("mock://")
            .ok_or_else(|| BackendError::FetchFailed(format!("bad url {}", url)))?;
        let data = self
            .objects
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::FetchFailed(format!("unknown object {}", id)))?;

        let piece = self.fetch_piece_size;
        let mut pieces = Vec::new();
        let mut rest = data;
        while rest.len() > piece {
            pieces.push(Ok(rest.split_to(piece)));
        }
        if !rest.is_empty() {
            pieces.push(Ok(rest));
        }
        Ok(Box::pin(stream::iter(pieces)))
    }
}

/// Test application: server plus handles on the mock seams.
pub struct TestApp {
    pub server: TestServer,
    pub backend: Arc<MockBlobBackend>,
    pub store: Arc<MemoryMetadataStore>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

fn test_config() -> Config {
    Config {
        server_port: 0,
        cors_origins: vec!["*".to_string()],
        environment: "test".to_string(),
        metadata_path: "unused".to_string(),
        blob_backend_url: "mock://backend".to_string(),
        blob_backend_token: None,
        blob_backend_timeout_secs: 5,
        // No blanket delay in tests; the retry path is exercised through
        // injected rate limits with tiny windows.
        upload_throttle_ms: 0,
        heartbeat_interval_secs: 0,
    }
}

/// Setup test app with in-memory metadata and a mock blob backend.
pub fn setup_test_app() -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryMetadataStore::new());
    let backend = Arc::new(MockBlobBackend::new());

    let state = Arc::new(AppState::new(
        config.clone(),
        store.clone(),
        backend.clone(),
    ));
    let router = routes::setup_routes(&config, state).expect("router setup");

    TestApp {
        server: TestServer::new(router).expect("test server"),
        backend,
        store,
    }
}

/// Deterministic file content: byte i is `i mod 251`.
pub fn patterned_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// One chunk-upload call.
pub async fn post_chunk(
    client: &TestServer,
    file_id: &str,
    file_name: &str,
    file_size: u64,
    chunk_index: u64,
    total_chunks: u64,
    chunk: &[u8],
) -> axum_test::TestResponse {
    let part = Part::bytes(Bytes::copy_from_slice(chunk))
        .file_name("blob")
        .mime_type("application/octet-stream");
    let form = MultipartForm::new()
        .add_text("fileId", file_id)
        .add_text("fileName", file_name)
        .add_text("fileSize", file_size.to_string())
        .add_text("chunkIndex", chunk_index.to_string())
        .add_text("chunkSize", CHUNK_SIZE.to_string())
        .add_text("totalChunks", total_chunks.to_string())
        .add_part("chunk", part);
    client.post("/u").multipart(form).await
}

/// Upload `data` as consecutive chunks and return the delete token from the
/// completion response.
pub async fn upload_file(client: &TestServer, file_id: &str, file_name: &str, data: &[u8]) -> String {
    let total_chunks = (data.len() as u64).div_ceil(CHUNK_SIZE).max(1);
    let mut delete_token = None;

    for (index, chunk) in data.chunks(CHUNK_SIZE as usize).enumerate() {
        let response = post_chunk(
            client,
            file_id,
            file_name,
            data.len() as u64,
            index as u64,
            total_chunks,
            chunk,
        )
        .await;
        assert_eq!(response.status_code(), 200, "chunk {} rejected", index);

        let body: serde_json::Value = response.json();
        if index as u64 + 1 == total_chunks {
            assert_eq!(body["done"], true);
            delete_token = body["deleteToken"].as_str().map(str::to_string);
        } else {
            assert_eq!(body["done"], false);
            assert_eq!(body["nextChunkIndex"], index as u64 + 1);
        }
    }

    delete_token.expect("completion response carried no delete token")
}
