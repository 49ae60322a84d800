//! Shardbox Core Library
//!
//! This crate provides the domain models, error types, configuration, and the
//! pure chunk/range arithmetic shared across all Shardbox components.

pub mod config;
pub mod constants;
pub mod error;
pub mod filename;
pub mod models;
pub mod range;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use filename::{chunk_object_name, format_file_name};
pub use models::FileRecord;
pub use range::{parse_open_range, RangePlan};
