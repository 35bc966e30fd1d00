//! Shared application state for axum handlers.

use crate::config::RelayConfig;

/// Application state shared across all relay connections.
///
/// Holds only immutable configuration; relay connections are fully
/// independent and keep no shared mutable state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration
    pub config: RelayConfig,
}

impl AppState {
    /// Create application state from configuration.
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }
}
