//! Relay connector.
//!
//! Registers with the local message relay as a named application over a
//! WebSocket and answers each request frame with the handler's response:
//!
//! ```text
//! relay -> githook   {"id": 7, "body": "payload=%7B...%7D"}
//! githook -> relay   {"type": "reply", "id": 7, "body": "Running job for repository: repo1"}
//! ```
//!
//! Unlike the HTTP listener the relay is a single connection. Losing it ends
//! the loop with an error; the process exits once running jobs have finished.

use std::future::Future;
use std::time::Duration;

use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use githook_pipeline::{DispatchCoordinator, RequestHandler};

use crate::shutdown::drain;

pub type RelayStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("failed to connect to relay at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: Box<tungstenite::Error>,
    },

    #[error("relay connection failed: {0}")]
    Transport(Box<tungstenite::Error>),

    #[error("relay closed the connection")]
    Closed,
}

impl From<tungstenite::Error> for RelayError {
    fn from(e: tungstenite::Error) -> Self {
        Self::Transport(Box::new(e))
    }
}

/// A request forwarded by the relay.
#[derive(Debug, Deserialize)]
struct Envelope {
    id: serde_json::Value,
    #[serde(default)]
    body: String,
}

#[derive(Debug, Serialize)]
struct Reply<'a> {
    r#type: &'static str,
    id: &'a serde_json::Value,
    body: String,
}

/// `ws://127.0.0.1:<port>/<app>`
pub fn relay_url(port: u16, app: &str) -> String {
    format!("ws://127.0.0.1:{port}/{app}")
}

/// Open the relay connection for `app`.
pub async fn connect(port: u16, app: &str) -> Result<RelayStream, RelayError> {
    let url = relay_url(port, app);
    tracing::info!(%url, "Connecting to relay");

    let (ws, _response) = connect_async(url.as_str())
        .await
        .map_err(|e| RelayError::Connect {
            url: url.clone(),
            source: Box::new(e),
        })?;

    tracing::info!(%url, app, "Registered with relay");
    Ok(ws)
}

/// Serve `coordinator` over the relay, then wait up to `grace` for its jobs.
///
/// The wait happens whether the loop ended on `shutdown` or on a lost
/// connection; the loop's result is returned afterwards.
pub async fn run<S, F>(
    ws: S,
    coordinator: &DispatchCoordinator,
    shutdown: F,
    grace: Duration,
) -> Result<(), RelayError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>>
        + Sink<Message, Error = tungstenite::Error>
        + Unpin,
    F: Future<Output = ()>,
{
    let served = serve(ws, coordinator.clone(), shutdown).await;
    drain(coordinator, grace).await;
    served
}

/// Answer relay requests until `shutdown` resolves or the connection drops.
///
/// Returns `Ok(())` only for a requested shutdown; the relay going away is
/// [`RelayError::Closed`].
pub async fn serve<S, H, F>(mut ws: S, handler: H, shutdown: F) -> Result<(), RelayError>
where
    S: Stream<Item = Result<Message, tungstenite::Error>>
        + Sink<Message, Error = tungstenite::Error>
        + Unpin,
    H: RequestHandler,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                tracing::info!("Closing relay connection");
                // The relay may already be gone; nothing left to do either way.
                let _ = ws.send(Message::Close(None)).await;
                return Ok(());
            }
            msg = ws.next() => {
                let frame = match msg {
                    Some(Ok(Message::Text(text))) => text.into_bytes(),
                    Some(Ok(Message::Binary(bytes))) => bytes,
                    Some(Ok(Message::Close(frame))) => {
                        tracing::warn!(?frame, "Relay closed WebSocket");
                        return Err(RelayError::Closed);
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Relay receive error");
                        return Err(e.into());
                    }
                    None => return Err(RelayError::Closed),
                };

                if let Some(reply) = answer(&handler, &frame) {
                    ws.send(Message::Text(reply)).await?;
                }
            }
        }
    }
}

/// Build the reply frame for one request frame, or `None` when the frame is
/// not a request envelope.
fn answer<H: RequestHandler>(handler: &H, frame: &[u8]) -> Option<String> {
    let envelope: Envelope = match serde_json::from_slice(frame) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(
                error = %e,
                raw = %String::from_utf8_lossy(frame),
                "Malformed relay message"
            );
            return None;
        }
    };

    tracing::debug!(id = %envelope.id, "Relay request");
    let body = handler.handle(envelope.body.as_bytes());

    let reply = Reply {
        r#type: "reply",
        id: &envelope.id,
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    match serde_json::to_string(&reply) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode relay reply");
            None
        }
    }
}
