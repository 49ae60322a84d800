//! Upload session manager: the chunked-ingestion protocol and the
//! file-metadata state machine.
//!
//! One call ingests one chunk: read-or-create the record, push the chunk to
//! the blob backend (riding out its rate limiting), append the returned
//! reference, and flip the record to done when the final index lands. The
//! whole sequence runs under the per-file lock so concurrent chunk uploads
//! for one file cannot lose an append.

use crate::locks::FileLocks;
use bytes::Bytes;
use shardbox_core::constants::{MAX_CHUNK_SIZE_BYTES, MIN_CHUNK_SIZE_BYTES};
use shardbox_core::{chunk_object_name, format_file_name, AppError, FileRecord};
use shardbox_storage::{BackendError, BlobBackend, ChunkRef, MetadataStore};
use std::sync::Arc;
use std::time::Duration;

/// One chunk-upload call, already parsed and presence-checked by the handler.
#[derive(Debug)]
pub struct IngestChunkRequest {
    pub file_id: String,
    pub file_name: String,
    pub file_size: u64,
    pub chunk_index: u64,
    pub chunk_size: u64,
    pub total_chunks: u64,
    pub chunk: Bytes,
}

/// What the caller hears back after a chunk is ingested.
#[derive(Debug, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// Chunk accepted; the uploader should send `next_chunk_index` next.
    Accepted { next_chunk_index: u64 },
    /// Final chunk ingested; the upload is complete and the capability token
    /// authorizing deletion is handed out exactly here.
    Completed { delete_token: String },
}

pub struct UploadSessionManager {
    store: Arc<dyn MetadataStore>,
    backend: Arc<dyn BlobBackend>,
    locks: FileLocks,
    /// Blanket delay before every backend upload attempt.
    throttle: Duration,
}

impl UploadSessionManager {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        backend: Arc<dyn BlobBackend>,
        throttle: Duration,
    ) -> Self {
        UploadSessionManager {
            store,
            backend,
            locks: FileLocks::new(),
            throttle,
        }
    }

    /// Ingest one chunk. Validation failures happen before any side effect;
    /// a backend failure leaves the record untouched for that chunk, so
    /// retrying the same index is safe.
    pub async fn ingest_chunk(&self, req: IngestChunkRequest) -> Result<ChunkOutcome, AppError> {
        if req.chunk_size < MIN_CHUNK_SIZE_BYTES || req.chunk_size > MAX_CHUNK_SIZE_BYTES {
            return Err(AppError::InvalidInput(format!(
                "chunkSize must be between {} and {} bytes",
                MIN_CHUNK_SIZE_BYTES, MAX_CHUNK_SIZE_BYTES
            )));
        }

        let _guard = self.locks.acquire(&req.file_id).await;

        let existing = self.store.get(&req.file_id).await?;
        if let Some(record) = &existing {
            if record.done {
                return Err(AppError::Conflict(format!(
                    "File {} is already fully uploaded",
                    req.file_id
                )));
            }
            if record.is_full() {
                // The declared chunk count is exhausted but the final index
                // never arrived; accepting more would break the refs bound.
                return Err(AppError::Conflict(format!(
                    "File {} already holds all {} declared chunks",
                    req.file_id, record.total_chunks
                )));
            }
        }

        let mut record = match existing {
            Some(record) => record,
            None => {
                // First chunk call for this identifier: the declared metadata
                // is fixed here and ignored on every later call.
                let record = FileRecord::new(
                    req.file_id.clone(),
                    format_file_name(&req.file_name),
                    req.file_size,
                    req.chunk_size,
                    req.total_chunks,
                );
                if record.is_full() {
                    return Err(AppError::InvalidInput(
                        "totalChunks must be at least 1".to_string(),
                    ));
                }
                self.store.put(&record).await?;
                tracing::info!(
                    file_id = %record.file_id,
                    file_name = %record.file_name,
                    total_chunks = record.total_chunks,
                    file_size = record.file_size,
                    "Upload session created"
                );
                record
            }
        };

        let object_name = chunk_object_name(&record.file_name, req.chunk_index);
        let chunk_ref = self.upload_with_retry(&object_name, req.chunk).await?;

        record.push_chunk_ref(chunk_ref.0);
        self.store.put(&record).await?;

        tracing::info!(
            file_id = %record.file_id,
            chunk_index = req.chunk_index,
            refs = record.chunk_refs.len(),
            "Chunk ingested"
        );

        if req.chunk_index + 1 == record.total_chunks {
            record.complete();
            self.store.put(&record).await?;
            tracing::info!(file_id = %record.file_id, "Upload complete, delete token minted");
            let delete_token = record
                .delete_token
                .ok_or_else(|| AppError::Internal("completed record without token".to_string()))?;
            return Ok(ChunkOutcome::Completed { delete_token });
        }

        Ok(ChunkOutcome::Accepted {
            next_chunk_index: req.chunk_index + 1,
        })
    }

    /// Push one chunk to the backend, waiting out every rate-limit window it
    /// announces. The retry is unbounded on purpose: the remote service
    /// enforces its own throttle, and each resubmission still pays the
    /// blanket pre-upload delay.
    async fn upload_with_retry(
        &self,
        object_name: &str,
        data: Bytes,
    ) -> Result<ChunkRef, AppError> {
        let mut attempt: u32 = 1;
        loop {
            tokio::time::sleep(self.throttle).await;
            match self.backend.upload(object_name, data.clone()).await {
                Ok(chunk_ref) => return Ok(chunk_ref),
                Err(BackendError::RateLimited { retry_after }) => {
                    tracing::warn!(
                        object_name = %object_name,
                        attempt,
                        retry_after_secs = retry_after.as_secs(),
                        "Blob backend rate limited, waiting before resubmitting"
                    );
                    tokio::time::sleep(retry_after).await;
                    attempt += 1;
                }
                Err(e) => return Err(AppError::Backend(e.to_string())),
            }
        }
    }
}
