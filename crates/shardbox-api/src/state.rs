//! Application state shared by all handlers.

use crate::services::{DeletionAuthorizer, DownloadReconstructor, UploadSessionManager};
use shardbox_core::Config;
use shardbox_storage::{BlobBackend, MetadataStore};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct AppState {
    pub config: Config,
    pub uploads: UploadSessionManager,
    pub downloads: DownloadReconstructor,
    pub deletions: DeletionAuthorizer,
    /// Process start, for the health endpoint's uptime.
    pub started_at: Instant,
}

impl AppState {
    /// Wire the services against the injected persistence and backend seams.
    pub fn new(
        config: Config,
        store: Arc<dyn MetadataStore>,
        backend: Arc<dyn BlobBackend>,
    ) -> Self {
        let throttle = Duration::from_millis(config.upload_throttle_ms);
        AppState {
            uploads: UploadSessionManager::new(store.clone(), backend.clone(), throttle),
            downloads: DownloadReconstructor::new(store.clone(), backend),
            deletions: DeletionAuthorizer::new(store),
            config,
            started_at: Instant::now(),
        }
    }
}
