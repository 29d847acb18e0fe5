//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`files`] - Batch submission and file records
//! - [`system`] - Health, events, OpenAPI

mod files;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use files::*;
pub use system::*;
