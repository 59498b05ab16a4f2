//! Push-update channel over WebSocket.
//!
//! [`subscribe_updates`] opens a socket to the dashboard update endpoint
//! and hands every JSON text frame to a caller-supplied callback.
//! Malformed frames are logged and skipped. There is no reconnection:
//! once the connection drops, that [`Subscription`] is finished and the
//! caller decides whether to subscribe again.

use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_util::sync::CancellationToken;

/// Handle to a live push-update subscription.
///
/// Dropping the handle closes the subscription.
pub struct Subscription {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Stop reading updates. Calling this more than once is a no-op.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the subscription to end (server close, receive error or
    /// [`cancel`](Self::cancel)).
    pub async fn closed(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Realtime reader task panicked");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Errors from establishing the push channel.
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Connect to `url` and deliver every parsed JSON update to `callback`.
pub async fn subscribe_updates<F>(url: &str, callback: F) -> Result<Subscription, RealtimeError>
where
    F: FnMut(serde_json::Value) + Send + 'static,
{
    let (ws_stream, _response) = connect_async(url).await.map_err(|e| {
        RealtimeError::Connection(format!("Failed to connect to update channel at {url}: {e}"))
    })?;

    tracing::info!(url = %url, "Realtime channel connected");

    Ok(spawn_reader(ws_stream, callback))
}

/// Spawn the reader task over any stream of WebSocket frames.
pub fn spawn_reader<S, F>(stream: S, callback: F) -> Subscription
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin + Send + 'static,
    F: FnMut(serde_json::Value) + Send + 'static,
{
    let cancel = CancellationToken::new();
    let task = tokio::spawn(read_updates(stream, callback, cancel.clone()));
    Subscription {
        cancel,
        task: Some(task),
    }
}

/// Parse one text frame into a JSON update.
pub fn parse_update(text: &str) -> Result<serde_json::Value, serde_json::Error> {
    serde_json::from_str(text)
}

async fn read_updates<S, F>(mut stream: S, mut callback: F, cancel: CancellationToken)
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    F: FnMut(serde_json::Value),
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Realtime channel closed by client");
                break;
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => match parse_update(&text) {
                    Ok(update) => callback(update),
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            raw_message = %text,
                            "Failed to parse realtime update",
                        );
                    }
                },
                Some(Ok(Message::Binary(_))) => {
                    tracing::trace!("Ignoring binary realtime frame");
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(?frame, "Realtime channel closed by server");
                    break;
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Realtime channel receive error");
                    break;
                }
                None => {
                    tracing::info!("Realtime channel disconnected");
                    break;
                }
            }
        }
    }
}
