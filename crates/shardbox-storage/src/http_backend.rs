//! HTTP transport for the blob backend.
//!
//! Wire shape: `POST {base}/objects` with a multipart `file` part stores one
//! bounded object and answers `{"id": ...}`; `GET {base}/objects/{id}/url`
//! answers `{"url": ...}` with a transient fetch URL (404 when the reference
//! is unknown); the returned URL is fetched with a plain GET. HTTP 429 plus a
//! `Retry-After` header is the backend's rate-limit pushback.

use crate::backend::{BackendError, BackendResult, BlobBackend, ByteStream, ChunkRef};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

#[derive(Clone)]
pub struct HttpBlobBackend {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    id: String,
}

#[derive(Deserialize)]
struct ResolveResponse {
    url: String,
}

impl HttpBlobBackend {
    /// Build a backend client with the bounded per-call timeout the
    /// concurrency model requires.
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> BackendResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::UnexpectedResponse(format!("client build: {}", e)))?;

        Ok(HttpBlobBackend {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Map a 429 response to the rate-limit signal, honoring `Retry-After`
    /// when the backend names its throttle window.
    fn rate_limit_signal(response: &reqwest::Response) -> BackendError {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        BackendError::RateLimited {
            retry_after: Duration::from_secs(retry_after),
        }
    }

    fn map_request_error(e: reqwest::Error, context: &str) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout
        } else {
            BackendError::UnexpectedResponse(format!("{}: {}", context, e))
        }
    }
}

#[async_trait]
impl BlobBackend for HttpBlobBackend {
    async fn upload(&self, object_name: &str, data: Bytes) -> BackendResult<ChunkRef> {
        let size = data.len();
        let start = std::time::Instant::now();

        let part = reqwest::multipart::Part::stream(data).file_name(object_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .authorize(self.client.post(format!("{}/objects", self.base_url)))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::map_request_error(e, "upload"))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Self::rate_limit_signal(&response));
        }
        if !response.status().is_success() {
            return Err(BackendError::UploadFailed(format!(
                "backend answered {} for object {}",
                response.status(),
                object_name
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| BackendError::UnexpectedResponse(format!("upload body: {}", e)))?;

        tracing::info!(
            object_name = %object_name,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Blob backend upload successful"
        );

        Ok(ChunkRef(body.id))
    }

    async fn resolve(&self, chunk_ref: &ChunkRef) -> BackendResult<Option<String>> {
        let response = self
            .authorize(
                self.client
                    .get(format!("{}/objects/{}/url", self.base_url, chunk_ref)),
            )
            .send()
            .await
            .map_err(|e| Self::map_request_error(e, "resolve"))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Self::rate_limit_signal(&response));
        }
        if !response.status().is_success() {
            return Err(BackendError::ResolveFailed(format!(
                "backend answered {} for reference {}",
                response.status(),
                chunk_ref
            )));
        }

        let body: ResolveResponse = response
            .json()
            .await
            .map_err(|e| BackendError::UnexpectedResponse(format!("resolve body: {}", e)))?;

        Ok(Some(body.url))
    }

    async fn fetch(&self, url: &str) -> BackendResult<ByteStream> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::map_request_error(e, "fetch"))?;

        if !response.status().is_success() {
            return Err(BackendError::FetchFailed(format!(
                "backend answered {} for fetch URL",
                response.status()
            )));
        }

        let stream = response.bytes_stream().map(|result| {
            result.map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout
                } else {
                    BackendError::FetchFailed(format!("stream read: {}", e))
                }
            })
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let backend =
            HttpBlobBackend::new("http://backend.local/", None, Duration::from_secs(30)).unwrap();
        assert_eq!(backend.base_url, "http://backend.local");
    }
}
