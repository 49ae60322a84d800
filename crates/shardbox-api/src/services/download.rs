//! Download reconstructor: maps a requested byte range onto the ordered
//! sequence of remote chunks and streams the result.
//!
//! References are resolved to transient fetch URLs concurrently (resolution
//! has no ordering requirement), but bytes are always delivered in chunk-index
//! order. The returned stream is lazy: each chunk is fetched only when the
//! previous one has drained, so downstream backpressure propagates straight
//! into the backend fetches, and dropping the stream aborts whatever fetch is
//! in flight.

use async_stream::try_stream;
use bytes::Buf;
use futures::StreamExt;
use shardbox_core::{parse_open_range, AppError, RangePlan};
use shardbox_storage::{BackendError, BlobBackend, ByteStream, ChunkRef, MetadataStore};
use std::sync::Arc;

/// A reconstructed download, ready to be turned into an HTTP response.
pub struct FileDownload {
    pub file_name: String,
    /// Value for `Content-Length`.
    pub content_length: u64,
    /// `Content-Range` value when this is a partial response.
    pub content_range: Option<String>,
    pub stream: ByteStream,
}

impl FileDownload {
    pub fn is_partial(&self) -> bool {
        self.content_range.is_some()
    }
}

/// Byte window to forward from one chunk; `None` forwards the chunk in full.
type ChunkFetch = (String, Option<(u64, u64)>);

pub struct DownloadReconstructor {
    store: Arc<dyn MetadataStore>,
    backend: Arc<dyn BlobBackend>,
}

impl DownloadReconstructor {
    pub fn new(store: Arc<dyn MetadataStore>, backend: Arc<dyn BlobBackend>) -> Self {
        DownloadReconstructor { store, backend }
    }

    /// Reconstruct `file_id`, honoring an optional `Range` header value.
    /// Only the `bytes=<start>-` form selects a partial response; any other
    /// syntax is treated as if no range was sent.
    pub async fn download(
        &self,
        file_id: &str,
        range_header: Option<&str>,
    ) -> Result<FileDownload, AppError> {
        let record = self
            .store
            .get(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No file stored under {}", file_id)))?;

        // Resolve every reference up front, concurrently; delivery order is
        // imposed by the stream below, not by resolution order.
        let urls = futures::future::try_join_all(record.chunk_refs.iter().map(|r| {
            let chunk_ref = ChunkRef(r.clone());
            let backend = self.backend.clone();
            async move {
                backend.resolve(&chunk_ref).await?.ok_or_else(|| {
                    BackendError::ResolveFailed(format!(
                        "reference {} unknown to backend",
                        chunk_ref
                    ))
                })
            }
        }))
        .await
        .map_err(|e| AppError::Backend(e.to_string()))?;

        let start = range_header.and_then(parse_open_range);

        let (content_length, content_range, fetches) = match start {
            None => {
                let fetches = urls.into_iter().map(|url| (url, None)).collect::<Vec<_>>();
                (record.file_size, None, fetches)
            }
            Some(start) => {
                let plan = RangePlan::compute(start, record.file_size, record.chunk_size)
                    .ok_or_else(|| {
                        AppError::RangeNotSatisfiable(format!(
                            "start offset {} is beyond the last byte of {}",
                            start, file_id
                        ))
                    })?;

                let fetches = plan
                    .parts()
                    .filter_map(|part| {
                        let window = plan.window(part);
                        urls.get(part)
                            .map(|url| (url.clone(), Some((window.skip, window.take))))
                    })
                    .collect::<Vec<_>>();

                (plan.content_length(), Some(plan.content_range()), fetches)
            }
        };

        tracing::debug!(
            file_id = %file_id,
            partial = content_range.is_some(),
            content_length,
            parts = fetches.len(),
            "Download reconstructed"
        );

        Ok(FileDownload {
            file_name: record.file_name,
            content_length,
            content_range,
            stream: chunk_stream(self.backend.clone(), fetches),
        })
    }
}

/// Concatenate the selected chunks into one byte stream, slicing the first and
/// last chunk down to their windows. A failed fetch surfaces as a terminal
/// stream error; by then headers are long gone, so the connection is simply
/// cut.
fn chunk_stream(backend: Arc<dyn BlobBackend>, fetches: Vec<ChunkFetch>) -> ByteStream {
    Box::pin(try_stream! {
        for (url, window) in fetches {
            let mut inner = backend.fetch(&url).await?;
            match window {
                None => {
                    while let Some(chunk) = inner.next().await {
                        yield chunk?;
                    }
                }
                Some((skip, take)) => {
                    let mut to_skip = skip;
                    let mut remaining = take;
                    while remaining > 0 {
                        let Some(chunk) = inner.next().await else { break };
                        let mut chunk = chunk?;
                        if to_skip > 0 {
                            if (chunk.len() as u64) <= to_skip {
                                to_skip -= chunk.len() as u64;
                                continue;
                            }
                            chunk.advance(to_skip as usize);
                            to_skip = 0;
                        }
                        if (chunk.len() as u64) > remaining {
                            chunk.truncate(remaining as usize);
                        }
                        remaining -= chunk.len() as u64;
                        yield chunk;
                    }
                    // Anything past the window is dropped with the fetch.
                }
            }
        }
    })
}
