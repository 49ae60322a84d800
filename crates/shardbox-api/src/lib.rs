//! Shardbox API Library
//!
//! This crate provides the HTTP API handlers, the chunked-object lifecycle
//! services behind them, and the application setup.

// Module declarations
mod api_doc;
pub mod handlers;
pub mod locks;
pub mod logging;
pub mod services;
pub mod setup;
pub mod state;

// Public modules
pub mod error;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
