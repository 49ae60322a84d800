//! Shared constants.

/// Smallest chunk size the upload endpoint accepts (1 MiB).
pub const MIN_CHUNK_SIZE_BYTES: u64 = 1024 * 1024;

/// Largest chunk size the upload endpoint accepts (50 MiB). The blob backend
/// only takes bounded objects, so this is also the per-object ceiling.
pub const MAX_CHUNK_SIZE_BYTES: u64 = 50 * 1024 * 1024;

/// Length in bytes of the random material behind a delete token.
pub const DELETE_TOKEN_BYTES: usize = 32;
