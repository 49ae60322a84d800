//! File download handler: `GET /{file_id}` with optional open-ended range.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use shardbox_core::AppError;
use shardbox_storage::validate_file_id;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/{file_id}",
    tag = "download",
    params(
        ("file_id" = String, Path, description = "File identifier"),
        ("Range" = Option<String>, Header, description = "Open-ended byte range, e.g. 'bytes=5000000-'")
    ),
    responses(
        (status = 200, description = "Full file stream"),
        (status = 206, description = "Partial content from the requested offset"),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 416, description = "Range start beyond end of file", body = ErrorResponse),
        (status = 500, description = "Blob backend failure", body = ErrorResponse)
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    validate_file_id(&file_id).map_err(AppError::from)?;

    let range_header = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let download = state
        .downloads
        .download(&file_id, range_header.as_deref())
        .await?;

    let status = if download.is_partial() {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };
    let content_type = mime_guess::from_path(&download.file_name)
        .first_or_octet_stream()
        .to_string();

    let mut builder = Response::builder()
        .status(status)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, download.content_length)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download.file_name),
        );
    if let Some(content_range) = &download.content_range {
        builder = builder.header(header::CONTENT_RANGE, content_range);
    }

    let response = builder
        .body(Body::from_stream(download.stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
