//! Relay WebSocket handler: one downstream socket paired with one upstream
//! socket, forwarding frames verbatim in both directions.
//!
//! The relay is a dumb pipe. It never parses, validates, or transforms
//! payloads; all protocol logic lives in the client-side reassembler and in
//! the upstream provider. Lifecycle is coupled: close or error on either
//! side closes the other, and there is no automatic reconnect.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{self, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message as UpstreamMessage;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::AppState;

use super::upstream;

/// What to do with one received frame.
///
/// Ping/Pong frames are answered by the transport layers on both legs and
/// are not forwarded.
pub(crate) enum Forward<T> {
    /// Forward this frame to the peer
    Frame(T),
    /// Drop the frame without forwarding
    Ignore,
    /// The sender is closing; tear the pair down
    Close,
}

/// Convert a downstream frame into its upstream form, payload untouched.
pub(crate) fn downstream_to_upstream(msg: ws::Message) -> Forward<UpstreamMessage> {
    match msg {
        ws::Message::Text(text) => Forward::Frame(UpstreamMessage::text(text.as_str())),
        ws::Message::Binary(data) => Forward::Frame(UpstreamMessage::binary(data)),
        ws::Message::Close(_) => Forward::Close,
        ws::Message::Ping(_) | ws::Message::Pong(_) => Forward::Ignore,
    }
}

/// Convert an upstream frame into its downstream form, payload untouched.
pub(crate) fn upstream_to_downstream(msg: UpstreamMessage) -> Forward<ws::Message> {
    match msg {
        UpstreamMessage::Text(text) => Forward::Frame(ws::Message::Text(text.as_str().into())),
        UpstreamMessage::Binary(data) => Forward::Frame(ws::Message::Binary(data)),
        UpstreamMessage::Close(_) => Forward::Close,
        UpstreamMessage::Ping(_) | UpstreamMessage::Pong(_) | UpstreamMessage::Frame(_) => {
            Forward::Ignore
        }
    }
}

/// Relay WebSocket handler.
///
/// Upgrades the HTTP connection and pairs it with a freshly opened upstream
/// connection.
pub async fn relay_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("downstream WebSocket upgrade requested");
    ws.on_upgrade(move |socket| handle_relay_socket(socket, state))
}

/// Drive one relay pair until either side closes or errors.
async fn handle_relay_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let conn_id = Uuid::new_v4();

    let upstream = match upstream::connect(&state.config).await {
        Ok(upstream) => upstream,
        Err(e) => {
            warn!(%conn_id, error = %e, "upstream connect failed, closing downstream");
            let _ = socket.send(ws::Message::Close(None)).await;
            return;
        }
    };

    info!(%conn_id, "relay pair established");

    let (mut down_sink, mut down_stream) = socket.split();
    let (mut up_sink, mut up_stream) = upstream.split();

    loop {
        tokio::select! {
            frame = down_stream.next() => {
                match frame {
                    Some(Ok(msg)) => match downstream_to_upstream(msg) {
                        Forward::Frame(out) => {
                            if let Err(e) = up_sink.send(out).await {
                                warn!(%conn_id, error = %e, "upstream send failed");
                                break;
                            }
                        }
                        Forward::Ignore => {}
                        Forward::Close => {
                            info!(%conn_id, "downstream closed");
                            break;
                        }
                    },
                    Some(Err(e)) => {
                        warn!(%conn_id, error = %e, "downstream socket error");
                        break;
                    }
                    None => {
                        info!(%conn_id, "downstream disconnected");
                        break;
                    }
                }
            }

            frame = up_stream.next() => {
                match frame {
                    Some(Ok(msg)) => match upstream_to_downstream(msg) {
                        Forward::Frame(out) => {
                            if let Err(e) = down_sink.send(out).await {
                                warn!(%conn_id, error = %e, "downstream send failed");
                                break;
                            }
                        }
                        Forward::Ignore => {}
                        Forward::Close => {
                            info!(%conn_id, "upstream closed");
                            break;
                        }
                    },
                    Some(Err(e)) => {
                        warn!(%conn_id, error = %e, "upstream socket error");
                        break;
                    }
                    None => {
                        info!(%conn_id, "upstream disconnected");
                        break;
                    }
                }
            }
        }
    }

    // Lifecycle coupling: whichever side ended, close the other too.
    let _ = up_sink.send(UpstreamMessage::Close(None)).await;
    let _ = down_sink.send(ws::Message::Close(None)).await;

    info!(%conn_id, "relay pair closed");
}
