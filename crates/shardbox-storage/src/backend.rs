//! Blob backend abstraction
//!
//! The remote object store only accepts bounded-size objects and pushes back
//! with rate-limit signals. This module defines the interface the lifecycle
//! engine calls; the transport lives in `http_backend`.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Opaque reference to one stored chunk, meaningful only to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkRef(pub String);

impl ChunkRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ChunkRef {
    fn from(s: String) -> Self {
        ChunkRef(s)
    }
}

impl std::fmt::Display for ChunkRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Blob backend operation errors
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend throttled the call. Callers wait `retry_after` and resubmit
    /// the identical request; this variant never reaches a client.
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Resolve failed: {0}")]
    ResolveFailed(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Backend call timed out")]
    Timeout,

    #[error("Unexpected backend response: {0}")]
    UnexpectedResponse(String),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Byte stream handed back by `fetch`.
pub type ByteStream = Pin<Box<dyn Stream<Item = BackendResult<Bytes>> + Send>>;

/// The remote bounded-object store, as seen by the lifecycle engine.
///
/// `upload` stores one chunk under a display name and returns the opaque
/// reference; `resolve` turns a reference into a transient fetch URL
/// (`None` when the backend no longer knows the reference); `fetch` streams
/// the bytes behind such a URL. Every call carries the transport's bounded
/// timeout.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    async fn upload(&self, object_name: &str, data: Bytes) -> BackendResult<ChunkRef>;

    async fn resolve(&self, chunk_ref: &ChunkRef) -> BackendResult<Option<String>>;

    async fn fetch(&self, url: &str) -> BackendResult<ByteStream>;
}
