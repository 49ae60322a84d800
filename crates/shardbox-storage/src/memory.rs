//! In-memory metadata store, for tests and ephemeral deployments.

use crate::metadata::{validate_file_id, MetadataResult, MetadataStore};
use async_trait::async_trait;
use shardbox_core::FileRecord;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct MemoryMetadataStore {
    records: Arc<RwLock<HashMap<String, FileRecord>>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held. Test helper.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn get(&self, file_id: &str) -> MetadataResult<Option<FileRecord>> {
        validate_file_id(file_id)?;
        Ok(self.records.read().await.get(file_id).cloned())
    }

    async fn put(&self, record: &FileRecord) -> MetadataResult<()> {
        validate_file_id(&record.file_id)?;
        self.records
            .write()
            .await
            .insert(record.file_id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, file_id: &str) -> MetadataResult<()> {
        validate_file_id(file_id)?;
        self.records.write().await.remove(file_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_and_delete() {
        let store = MemoryMetadataStore::new();
        let rec = FileRecord::new("f1".to_string(), "a.txt".to_string(), 10, 1_048_576, 1);

        store.put(&rec).await.unwrap();
        assert_eq!(store.get("f1").await.unwrap(), Some(rec));
        assert_eq!(store.len().await, 1);

        store.delete("f1").await.unwrap();
        assert!(store.get("f1").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn validates_keys_like_the_fs_store() {
        let store = MemoryMetadataStore::new();
        assert!(store.get("a/b").await.is_err());
    }
}
