//! Application state for the API server

use crate::{Config, FileRelay};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The relay that runs submitted batches
    pub relay: Arc<FileRelay>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(relay: Arc<FileRelay>, config: Arc<Config>) -> Self {
        Self { relay, config }
    }
}
