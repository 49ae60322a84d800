//! The durable metadata document for one file identifier.

use crate::constants::DELETE_TOKEN_BYTES;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One record per file identifier, persisted by the metadata store as a single
/// atomic document. Unknown fields are rejected on load so a foreign or
/// corrupted document cannot masquerade as a record.
///
/// State machine: created (`done == false`, no refs) → accumulating (refs
/// appended in ingestion order) → complete (`done == true`, token minted,
/// irreversible) → deleted (document erased).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileRecord {
    pub file_id: String,
    /// Normalized display name, immutable once set.
    pub file_name: String,
    /// Total byte length declared by the uploader.
    pub file_size: u64,
    /// Byte size of every chunk except possibly the last. Immutable.
    pub chunk_size: u64,
    /// Declared chunk count. Immutable.
    pub total_chunks: u64,
    /// Opaque backend references, one per ingested chunk, append-only.
    pub chunk_refs: Vec<String>,
    pub done: bool,
    /// Minted exactly once, when `done` flips to true.
    pub delete_token: Option<String>,
}

impl FileRecord {
    /// Fresh record for the first chunk call of a new file identifier.
    pub fn new(
        file_id: String,
        file_name: String,
        file_size: u64,
        chunk_size: u64,
        total_chunks: u64,
    ) -> Self {
        FileRecord {
            file_id,
            file_name,
            file_size,
            chunk_size,
            total_chunks,
            chunk_refs: Vec::new(),
            done: false,
            delete_token: None,
        }
    }

    /// Whether the record already holds a reference for every declared chunk.
    pub fn is_full(&self) -> bool {
        self.chunk_refs.len() as u64 >= self.total_chunks
    }

    /// Append the backend reference for one ingested chunk.
    pub fn push_chunk_ref(&mut self, chunk_ref: String) {
        self.chunk_refs.push(chunk_ref);
    }

    /// Mark the upload complete and mint the delete token. Idempotent on the
    /// token: once minted it is never regenerated.
    pub fn complete(&mut self) {
        self.done = true;
        if self.delete_token.is_none() {
            self.delete_token = Some(mint_delete_token());
        }
    }
}

/// Capability string authorizing deletion: hex of 32 CSPRNG bytes.
fn mint_delete_token() -> String {
    let mut bytes = [0u8; DELETE_TOKEN_BYTES];
    rand::rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}
