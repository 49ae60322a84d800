//! File deletion handler: `DELETE /{file_id}` gated by the delete token.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shardbox_core::AppError;
use shardbox_storage::validate_file_id;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteFileRequest {
    pub token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileResponse {
    pub message: String,
    pub file_id: String,
}

#[utoipa::path(
    delete,
    path = "/{file_id}",
    tag = "delete",
    params(
        ("file_id" = String, Path, description = "File identifier")
    ),
    request_body = DeleteFileRequest,
    responses(
        (status = 200, description = "File metadata deleted", body = DeleteFileResponse),
        (status = 400, description = "Missing delete token", body = ErrorResponse),
        (status = 403, description = "Invalid delete token", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    body: Result<Json<DeleteFileRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    validate_file_id(&file_id).map_err(AppError::from)?;

    // A missing or non-JSON body is treated the same as a missing token.
    let token = match body {
        Ok(Json(request)) => request.token,
        Err(_) => None,
    };

    state
        .deletions
        .delete_file(&file_id, token.as_deref())
        .await?;

    Ok(Json(DeleteFileResponse {
        message: "File deleted successfully".to_string(),
        file_id,
    }))
}
