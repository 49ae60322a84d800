//! The chunked-object lifecycle services behind the HTTP handlers.

pub mod delete;
pub mod download;
pub mod upload;

pub use delete::DeletionAuthorizer;
pub use download::{DownloadReconstructor, FileDownload};
pub use upload::{ChunkOutcome, IngestChunkRequest, UploadSessionManager};
