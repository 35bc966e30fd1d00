//! Client session: a live connection feeding one [`StreamReassembler`].
//!
//! The reassembler is moved into the connection task and owned exclusively
//! by it; events are handled one at a time, to completion, so accumulator
//! transitions are atomic. Closing the connection drops the reassembler and
//! with it all pending accumulator state; nothing is flushed after close.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::errors::{RelayError, RelayResult};

use super::events::ClientEvent;
use super::reassembly::StreamReassembler;

/// Channel capacity for outbound commands.
const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Routes carried by the command channel.
enum Route {
    Event(ClientEvent),
    Close,
}

/// A connected chat client.
///
/// Outbound commands flow through a channel into the connection task;
/// inbound text frames are decoded and fed to the reassembler.
pub struct ChatClient {
    command_tx: mpsc::Sender<Route>,
    task: JoinHandle<()>,
}

impl ChatClient {
    /// Connect to a relay (or directly to an upstream endpoint that needs no
    /// handshake headers) and spawn the session event loop.
    pub async fn connect(url: &str, reassembler: StreamReassembler) -> RelayResult<Self> {
        let (ws, _response) = tokio_tungstenite::connect_async(url).await?;
        info!(url, "chat session connected");

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let task = tokio::spawn(run_session(ws, command_rx, reassembler));

        Ok(Self { command_tx, task })
    }

    /// Send one raw client event.
    pub async fn send_event(&self, event: ClientEvent) -> RelayResult<()> {
        self.command_tx
            .send(Route::Event(event))
            .await
            .map_err(|_| RelayError::ConnectionClosed)
    }

    /// Send a user text message and request a text+audio response.
    pub async fn send_text(&self, text: &str) -> RelayResult<()> {
        self.send_event(ClientEvent::user_text(text)).await?;
        self.send_event(ClientEvent::create_response()).await
    }

    /// Close the connection and wait for the session task to finish.
    pub async fn close(self) {
        let _ = self.command_tx.send(Route::Close).await;
        let _ = self.task.await;
    }
}

async fn run_session<S>(
    ws: tokio_tungstenite::WebSocketStream<S>,
    mut command_rx: mpsc::Receiver<Route>,
    mut reassembler: StreamReassembler,
) where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            command = command_rx.recv() => {
                let event = match command {
                    Some(Route::Event(event)) => event,
                    Some(Route::Close) | None => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                };
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!(error = %e, "failed to serialize client event");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::text(json)).await {
                    warn!(error = %e, "failed to send client event");
                    break;
                }
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => reassembler.handle_raw(text.as_str()),
                    Some(Ok(Message::Close(_))) => {
                        debug!("session closed by peer");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "session socket error");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    // The reassembler drops here; partial accumulator state is discarded.
    info!("chat session ended");
}
