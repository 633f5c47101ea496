//! WebSocket implementation of the duplex chat channel
//!
//! Connects to the backend's `/ws` endpoint with the identity carried as a
//! URL-encoded `username` query parameter. Outbound frames are raw message
//! text; inbound text frames are surfaced verbatim as
//! [`ChannelEvent::Message`] values (prefix stripping happens in the
//! engine). Two background tasks drive the socket: one forwards queued
//! outbound text to the sink, one pumps inbound frames into the event
//! channel and reports the close reason exactly once.

use std::pin::Pin;
use std::sync::Arc;

use futures::{SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::channel::{ChannelEvent, CloseReason, DuplexConnection, DuplexConnector};
use crate::error::{CarelinkError, Result};

/// Connector building one WebSocket connection per `connect` call
///
/// # Examples
///
/// ```no_run
/// use url::Url;
/// use carelink::channel::WsConnector;
///
/// let connector = WsConnector::new(Url::parse("ws://localhost:5000/ws").unwrap());
/// ```
#[derive(Debug)]
pub struct WsConnector {
    /// Channel endpoint without the identity parameter.
    ws_url: url::Url,
}

impl WsConnector {
    /// Construct a connector targeting `ws_url` (e.g. `ws://host:5000/ws`)
    pub fn new(ws_url: url::Url) -> Self {
        Self { ws_url }
    }

    /// Builds the per-identity address (`.../ws?username=<encoded>`)
    fn address_for(&self, identity: &str) -> url::Url {
        let mut url = self.ws_url.clone();
        url.query_pairs_mut().clear().append_pair("username", identity);
        url
    }
}

#[async_trait::async_trait]
impl DuplexConnector for WsConnector {
    async fn connect(&self, identity: &str) -> Result<Box<dyn DuplexConnection>> {
        let address = self.address_for(identity);
        tracing::info!(%address, "opening duplex channel");

        let (stream, _response) = connect_async(address.as_str())
            .await
            .map_err(|e| CarelinkError::Channel(format!("Handshake failed: {}", e)))?;

        Ok(Box::new(WsConnection::spawn(stream)))
    }
}

/// One live WebSocket connection
///
/// Sends go through an unbounded queue drained by the writer task; events
/// arrive on a shared receiver exposed via [`DuplexConnection::events`].
#[derive(Debug)]
pub struct WsConnection {
    /// Queue drained by the writer task.
    outbound_tx: mpsc::UnboundedSender<String>,
    /// Shared receiver exposed via `events()`.
    events_rx: Arc<Mutex<mpsc::UnboundedReceiver<ChannelEvent>>>,
}

impl WsConnection {
    /// Wraps an established socket and spawns its I/O tasks
    fn spawn<S>(stream: tokio_tungstenite::WebSocketStream<S>) -> Self
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        let (mut sink, mut source) = stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (events_tx, events_rx) = mpsc::unbounded_channel::<ChannelEvent>();

        // The handshake already completed; the channel is ready.
        let _ = events_tx.send(ChannelEvent::Opened);

        // Writer: forward queued outbound text, then close the socket when
        // the connection handle is dropped.
        tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if let Err(e) = sink.send(WsMessage::Text(text)).await {
                    tracing::warn!(error = %e, "outbound frame failed");
                    break;
                }
            }
            let _ = sink.send(WsMessage::Close(None)).await;
        });

        // Reader: pump inbound frames and report the close reason once.
        tokio::spawn(async move {
            let reason = loop {
                match source.next().await {
                    Some(Ok(WsMessage::Text(text))) => {
                        if events_tx.send(ChannelEvent::Message(text)).is_err() {
                            // Receiver dropped; nobody is listening anymore.
                            return;
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break CloseReason::Clean,
                    Some(Ok(_)) => {
                        // Ping/pong/binary frames carry no chat payload.
                    }
                    Some(Err(e)) => break CloseReason::Error(e.to_string()),
                }
            };
            tracing::info!(?reason, "duplex channel closed");
            let _ = events_tx.send(ChannelEvent::Closed { reason });
        });

        Self {
            outbound_tx,
            events_rx: Arc::new(Mutex::new(events_rx)),
        }
    }
}

#[async_trait::async_trait]
impl DuplexConnection for WsConnection {
    async fn send(&self, text: String) -> Result<()> {
        self.outbound_tx
            .send(text)
            .map_err(|_| CarelinkError::Channel("Connection writer has shut down".to_string()).into())
    }

    fn events(&self) -> Pin<Box<dyn Stream<Item = ChannelEvent> + Send + '_>> {
        let rx = Arc::clone(&self.events_rx);
        Box::pin(futures::stream::unfold(rx, |rx| async move {
            let mut guard = rx.lock().await;
            let item = guard.recv().await?;
            drop(guard);
            Some((item, rx))
        }))
    }
}
