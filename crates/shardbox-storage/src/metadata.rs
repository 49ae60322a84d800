//! Metadata persistence abstraction
//!
//! This module defines the MetadataStore trait that all metadata backends must
//! implement, plus the key validation every backend shares.

use async_trait::async_trait;
use shardbox_core::FileRecord;
use thiserror::Error;

/// Metadata operation errors
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid file identifier: {0}")]
    InvalidKey(String),

    #[error("Corrupt record for {file_id}: {reason}")]
    Corrupt { file_id: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for metadata operations
pub type MetadataResult<T> = Result<T, MetadataError>;

impl From<MetadataError> for shardbox_core::AppError {
    fn from(err: MetadataError) -> Self {
        use shardbox_core::AppError;
        match err {
            MetadataError::NotFound(msg) => AppError::NotFound(msg),
            MetadataError::InvalidKey(msg) => AppError::InvalidInput(msg),
            MetadataError::Corrupt { file_id, reason } => {
                AppError::Internal(format!("corrupt metadata record {}: {}", file_id, reason))
            }
            MetadataError::IoError(e) => AppError::Internal(format!("metadata IO error: {}", e)),
            MetadataError::ConfigError(msg) => AppError::Internal(msg),
        }
    }
}

/// Reject identifiers that are empty, oversized, or unsafe as storage keys.
/// The file identifier is caller-chosen and doubles as the persistence key,
/// so it must never be able to address anything outside the store.
pub fn validate_file_id(file_id: &str) -> MetadataResult<()> {
    const MAX_FILE_ID_LENGTH: usize = 128;

    if file_id.is_empty() || file_id.len() > MAX_FILE_ID_LENGTH {
        return Err(MetadataError::InvalidKey(format!(
            "file identifier must be 1-{} characters",
            MAX_FILE_ID_LENGTH
        )));
    }
    if !file_id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.')
    {
        return Err(MetadataError::InvalidKey(
            "file identifier may only contain [A-Za-z0-9._-]".to_string(),
        ));
    }
    if file_id.contains("..") {
        return Err(MetadataError::InvalidKey(
            "file identifier contains path traversal".to_string(),
        ));
    }
    Ok(())
}

/// Durable key-value persistence of one record per file identifier.
///
/// The upload session manager is the only writer; readers never mutate.
/// A `put` always replaces the whole record in a single atomic step, so a
/// crash can never leave a torn document behind.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Load the record for `file_id`, or `None` when it does not exist.
    async fn get(&self, file_id: &str) -> MetadataResult<Option<FileRecord>>;

    /// Atomically replace (or create) the record for `record.file_id`.
    async fn put(&self, record: &FileRecord) -> MetadataResult<()>;

    /// Erase the record. Deleting an absent record is not an error.
    async fn delete(&self, file_id: &str) -> MetadataResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_key_safe_identifiers() {
        assert!(validate_file_id("abc123").is_ok());
        assert!(validate_file_id("user-42_v1.bak").is_ok());
    }

    #[test]
    fn rejects_traversal_and_separators() {
        assert!(validate_file_id("../etc/passwd").is_err());
        assert!(validate_file_id("a/b").is_err());
        assert!(validate_file_id("a\\b").is_err());
        assert!(validate_file_id("..").is_err());
    }

    #[test]
    fn rejects_empty_and_oversized() {
        assert!(validate_file_id("").is_err());
        assert!(validate_file_id(&"x".repeat(129)).is_err());
        assert!(validate_file_id(&"x".repeat(128)).is_ok());
    }
}
