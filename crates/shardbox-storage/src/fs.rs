//! Filesystem metadata store: one JSON document per file identifier.

use crate::metadata::{validate_file_id, MetadataError, MetadataResult, MetadataStore};
use async_trait::async_trait;
use shardbox_core::FileRecord;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Stores each record as `{base_path}/{file_id}.json`, replaced atomically via
/// a temp file and rename so readers never observe a half-written document.
#[derive(Clone)]
pub struct FsMetadataStore {
    base_path: PathBuf,
}

impl FsMetadataStore {
    /// Create a new FsMetadataStore rooted at `base_path`, creating the
    /// directory when missing.
    pub async fn new(base_path: impl Into<PathBuf>) -> MetadataResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            MetadataError::ConfigError(format!(
                "Failed to create metadata directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(FsMetadataStore { base_path })
    }

    fn record_path(&self, file_id: &str) -> MetadataResult<PathBuf> {
        validate_file_id(file_id)?;
        Ok(self.base_path.join(format!("{}.json", file_id)))
    }
}

#[async_trait]
impl MetadataStore for FsMetadataStore {
    async fn get(&self, file_id: &str) -> MetadataResult<Option<FileRecord>> {
        let path = self.record_path(file_id)?;

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(MetadataError::IoError(e)),
        };

        let record: FileRecord =
            serde_json::from_slice(&bytes).map_err(|e| MetadataError::Corrupt {
                file_id: file_id.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Some(record))
    }

    async fn put(&self, record: &FileRecord) -> MetadataResult<()> {
        let path = self.record_path(&record.file_id)?;
        let tmp_path = self.base_path.join(format!("{}.json.tmp", record.file_id));
        let start = std::time::Instant::now();

        let bytes = serde_json::to_vec(record).map_err(|e| MetadataError::Corrupt {
            file_id: record.file_id.clone(),
            reason: e.to_string(),
        })?;

        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        // Rename is the atomic replace; the record is either old or new, never torn.
        fs::rename(&tmp_path, &path).await?;

        tracing::debug!(
            file_id = %record.file_id,
            path = %path.display(),
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Metadata record persisted"
        );

        Ok(())
    }

    async fn delete(&self, file_id: &str) -> MetadataResult<()> {
        let path = self.record_path(file_id)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(file_id = %file_id, "Metadata record deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MetadataError::IoError(e)),
        }
    }
}
