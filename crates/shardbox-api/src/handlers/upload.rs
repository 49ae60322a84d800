//! Chunk upload handler: `POST /u`, multipart.
//!
//! One call carries one binary `chunk` part plus the declared file metadata
//! as text fields. Every field is presence-checked and parsed before the
//! session manager is invoked, so malformed requests fail without side
//! effects.

use crate::error::{ErrorResponse, HttpAppError};
use crate::services::{ChunkOutcome, IngestChunkRequest};
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use shardbox_core::AppError;
use shardbox_storage::validate_file_id;
use std::sync::Arc;
use utoipa::ToSchema;

/// Response for a chunk upload: either progress or completion.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadChunkResponse {
    pub done: bool,
    pub file_id: String,
    /// Index the uploader should send next; absent once done.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_chunk_index: Option<u64>,
    /// Capability token authorizing deletion; present exactly when done.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_token: Option<String>,
}

#[derive(Default)]
struct ChunkUploadForm {
    chunk: Option<Bytes>,
    file_id: Option<String>,
    file_name: Option<String>,
    file_size: Option<String>,
    chunk_index: Option<String>,
    chunk_size: Option<String>,
    total_chunks: Option<String>,
}

fn require<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::InvalidInput(format!("Missing required field: {}", field)))
}

fn parse_u64(value: Option<String>, field: &str) -> Result<u64, AppError> {
    require(value, field)?
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Field {} must be a non-negative integer", field)))
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Unreadable multipart field: {}", e)))
}

#[utoipa::path(
    post,
    path = "/u",
    tag = "upload",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Chunk accepted or upload completed", body = UploadChunkResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 409, description = "File already fully uploaded", body = ErrorResponse),
        (status = 500, description = "Blob backend failure", body = ErrorResponse)
    )
)]
pub async fn upload_chunk(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut form = ChunkUploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("chunk") => {
                form.chunk = Some(field.bytes().await.map_err(|e| {
                    AppError::InvalidInput(format!("Unreadable chunk payload: {}", e))
                })?);
            }
            Some("fileId") => form.file_id = Some(text_field(field).await?),
            Some("fileName") => form.file_name = Some(text_field(field).await?),
            Some("fileSize") => form.file_size = Some(text_field(field).await?),
            Some("chunkIndex") => form.chunk_index = Some(text_field(field).await?),
            Some("chunkSize") => form.chunk_size = Some(text_field(field).await?),
            Some("totalChunks") => form.total_chunks = Some(text_field(field).await?),
            // Unknown parts are drained and ignored.
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    let file_id = require(form.file_id, "fileId")?;
    validate_file_id(&file_id).map_err(AppError::from)?;

    let request = IngestChunkRequest {
        file_name: require(form.file_name, "fileName")?,
        file_size: parse_u64(form.file_size, "fileSize")?,
        chunk_index: parse_u64(form.chunk_index, "chunkIndex")?,
        chunk_size: parse_u64(form.chunk_size, "chunkSize")?,
        total_chunks: parse_u64(form.total_chunks, "totalChunks")?,
        chunk: require(form.chunk, "chunk")?,
        file_id,
    };
    let file_id = request.file_id.clone();

    let response = match state.uploads.ingest_chunk(request).await? {
        ChunkOutcome::Accepted { next_chunk_index } => UploadChunkResponse {
            done: false,
            file_id,
            next_chunk_index: Some(next_chunk_index),
            delete_token: None,
        },
        ChunkOutcome::Completed { delete_token } => UploadChunkResponse {
            done: true,
            file_id,
            next_chunk_index: None,
            delete_token: Some(delete_token),
        },
    };

    Ok(Json(response))
}
