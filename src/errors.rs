//! Error types for the relay and configuration layers.
//!
//! Codec errors live next to the codec in [`crate::client::codec`]; the types
//! here cover everything around the sockets and process setup.

use thiserror::Error;

/// Errors that can occur while establishing or driving a relay connection.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The upstream URL could not be parsed or uses an unsupported scheme
    #[error("invalid upstream URL: {0}")]
    InvalidUpstreamUrl(String),

    /// Building the upstream handshake request failed
    #[error("upstream handshake request error: {0}")]
    Handshake(#[from] http::Error),

    /// The upstream WebSocket connection failed or dropped
    #[error("upstream WebSocket error: {0}")]
    Upstream(#[from] tokio_tungstenite::tungstenite::Error),

    /// The API credential required for the upstream connection is missing
    #[error("missing upstream API key (set OPENAI_API_KEY)")]
    MissingApiKey,

    /// Serializing an outbound command failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The connection's command channel is closed
    #[error("connection closed")]
    ConnectionClosed,
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

/// Errors raised while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("invalid upstream URL '{0}': must be a ws:// or wss:// URL")]
    InvalidUpstreamUrl(String),
}
