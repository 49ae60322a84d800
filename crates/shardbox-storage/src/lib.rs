//! Shardbox Storage Library
//!
//! The two seams the lifecycle engine talks through:
//!
//! - [`MetadataStore`]: durable key-value persistence of one [`FileRecord`]
//!   per file identifier (create-if-absent, read, full overwrite, delete).
//!   The filesystem implementation keeps one JSON document per record and
//!   replaces it atomically, never partially.
//! - [`BlobBackend`]: the remote bounded-object store. Uploads return an
//!   opaque reference; references resolve to transient fetch URLs; rate-limit
//!   pushback surfaces as a dedicated signal so callers can wait and resubmit
//!   instead of failing.
//!
//! File identifiers double as storage keys, so they must be key-safe: see
//! [`metadata::validate_file_id`].

pub mod backend;
pub mod fs;
pub mod http_backend;
pub mod memory;
pub mod metadata;

pub use backend::{BackendError, BackendResult, BlobBackend, ByteStream, ChunkRef};
pub use fs::FsMetadataStore;
pub use http_backend::HttpBlobBackend;
pub use memory::MemoryMetadataStore;
pub use metadata::{validate_file_id, MetadataError, MetadataResult, MetadataStore};

pub use shardbox_core::FileRecord;
