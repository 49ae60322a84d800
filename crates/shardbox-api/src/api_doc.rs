//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shardbox API",
        version = "0.1.0",
        description = "Chunked file storage API. Files are split into fixed-size chunks, \
                       stored on a rate-limited blob backend, and reassembled on download. \
                       Deletion requires the capability token minted when the upload completes."
    ),
    paths(
        handlers::health::health_check,
        handlers::upload::upload_chunk,
        handlers::download::download_file,
        handlers::delete::delete_file,
    ),
    components(schemas(
        error::ErrorResponse,
        handlers::health::HealthResponse,
        handlers::upload::UploadChunkResponse,
        handlers::delete::DeleteFileRequest,
        handlers::delete::DeleteFileResponse,
    )),
    tags(
        (name = "health", description = "Service liveness"),
        (name = "upload", description = "Chunked upload session"),
        (name = "download", description = "File reconstruction and range reads"),
        (name = "delete", description = "Token-gated deletion")
    )
)]
pub struct ApiDoc;

pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
