//! Upstream connector for the provider-facing WebSocket leg.

use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};
use tracing::debug;

use crate::config::RelayConfig;
use crate::errors::{RelayError, RelayResult};

/// The upstream socket type.
pub type UpstreamSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open one upstream connection, authenticated with the configured bearer
/// credential.
///
/// Called once per accepted downstream connection; there is no pooling or
/// reuse.
pub async fn connect(config: &RelayConfig) -> RelayResult<UpstreamSocket> {
    let api_key = config
        .api_key
        .as_deref()
        .ok_or(RelayError::MissingApiKey)?;

    let url = config.upstream_request_url();
    let parsed = url::Url::parse(&url)
        .map_err(|_| RelayError::InvalidUpstreamUrl(url.clone()))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| RelayError::InvalidUpstreamUrl(url.clone()))?;
    let host_header = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    let request = http::Request::builder()
        .uri(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .header("OpenAI-Beta", "realtime=v1")
        .header(
            "Sec-WebSocket-Key",
            tungstenite::handshake::client::generate_key(),
        )
        .header("Sec-WebSocket-Version", "13")
        .header("Connection", "Upgrade")
        .header("Upgrade", "websocket")
        .header("Host", host_header)
        .body(())?;

    let (ws, response) = connect_async(request).await?;
    debug!(status = ?response.status(), "upstream WebSocket connected");

    Ok(ws)
}
