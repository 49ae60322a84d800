//! Deletion authorizer: the capability-token gate in front of the only
//! destructive operation in the system.
//!
//! Deletion erases the metadata record; the chunk objects stay orphaned on
//! the backend. Token comparison is constant-time.

use shardbox_core::AppError;
use shardbox_storage::MetadataStore;
use std::sync::Arc;
use subtle::ConstantTimeEq;

pub struct DeletionAuthorizer {
    store: Arc<dyn MetadataStore>,
}

impl DeletionAuthorizer {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        DeletionAuthorizer { store }
    }

    /// Erase `file_id` if `token` matches the record's delete token. After
    /// this succeeds the identifier is free to be reused as a brand-new
    /// upload.
    pub async fn delete_file(&self, file_id: &str, token: Option<&str>) -> Result<(), AppError> {
        let record = self
            .store
            .get(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No file stored under {}", file_id)))?;

        let token =
            token.ok_or_else(|| AppError::InvalidInput("token is required".to_string()))?;

        let stored = record.delete_token.as_deref().ok_or_else(|| {
            AppError::Forbidden(format!(
                "File {} cannot be deleted: upload never completed",
                file_id
            ))
        })?;

        if stored.as_bytes().ct_eq(token.as_bytes()).unwrap_u8() == 0 {
            return Err(AppError::Forbidden("Invalid delete token".to_string()));
        }

        self.store.delete(file_id).await?;
        tracing::info!(file_id = %file_id, "File record deleted");
        Ok(())
    }
}
