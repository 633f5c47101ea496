//! In-process fake duplex channel for unit tests
//!
//! Provides [`FakeConnector`], [`FakeConnection`], and
//! [`FakeConnectionHandle`]: an in-memory pair that replaces the WebSocket
//! in tests. The test side reads what the engine sent via
//! `handle.outbound_rx` and injects server events via `handle.events_tx`.
//!
//! ```text
//! engine send() ------> outbound_tx ----> outbound_rx (handle reads)
//! handle events_tx ---> events_rx  -----> events()    (engine consumes)
//! ```

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::Stream;
use tokio::sync::{mpsc, Mutex};

use crate::channel::{ChannelEvent, DuplexConnection, DuplexConnector};
use crate::error::{CarelinkError, Result};

/// Connector handing out in-memory connections and capturing their handles
///
/// Each `connect` call produces a fresh `(FakeConnection, handle)` pair;
/// the handle is stored on the connector for the test to claim with
/// [`FakeConnector::take_handle`].
#[derive(Debug, Default)]
pub struct FakeConnector {
    /// Handles for connections handed out, oldest first
    handles: std::sync::Mutex<Vec<FakeConnectionHandle>>,
    /// Identities passed to `connect`, in call order
    pub identities: std::sync::Mutex<Vec<String>>,
    /// When set, the next `connect` call fails once
    fail_next: AtomicBool,
}

impl FakeConnector {
    /// Creates a connector with nothing scripted
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `connect` call fail with a handshake error
    pub fn fail_next_connect(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Claims the handle of the most recent connection
    pub fn take_handle(&self) -> Option<FakeConnectionHandle> {
        self.handles.lock().unwrap().pop()
    }

    /// Number of successful `connect` calls so far
    pub fn connection_count(&self) -> usize {
        self.identities.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl DuplexConnector for FakeConnector {
    async fn connect(&self, identity: &str) -> Result<Box<dyn DuplexConnection>> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(CarelinkError::Channel("Handshake failed: scripted".to_string()).into());
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<String>();
        let (events_tx, events_rx) = mpsc::unbounded_channel::<ChannelEvent>();

        self.identities.lock().unwrap().push(identity.to_string());
        self.handles.lock().unwrap().push(FakeConnectionHandle {
            outbound_rx,
            events_tx,
        });

        Ok(Box::new(FakeConnection {
            outbound_tx,
            events_rx: Arc::new(Mutex::new(events_rx)),
        }))
    }
}

/// The test-side handle for a [`FakeConnection`]
///
/// Use this to read frames the engine sent and to inject channel events
/// (`Opened`, `Message`, `Closed`) the engine will consume.
#[derive(Debug)]
pub struct FakeConnectionHandle {
    /// Receives frames the engine sent via `send()`
    pub outbound_rx: mpsc::UnboundedReceiver<String>,
    /// Injects events into the engine's `events()` stream
    pub events_tx: mpsc::UnboundedSender<ChannelEvent>,
}

/// In-memory [`DuplexConnection`] counterpart of [`FakeConnectionHandle`]
#[derive(Debug)]
pub struct FakeConnection {
    outbound_tx: mpsc::UnboundedSender<String>,
    events_rx: Arc<Mutex<mpsc::UnboundedReceiver<ChannelEvent>>>,
}

#[async_trait::async_trait]
impl DuplexConnection for FakeConnection {
    async fn send(&self, text: String) -> Result<()> {
        self.outbound_tx.send(text).map_err(|_| {
            anyhow::anyhow!(CarelinkError::Channel(
                "FakeConnection outbound channel closed".to_string()
            ))
        })
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

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::time::Duration;

    #[tokio::test]
    async fn test_send_delivers_to_handle() {
        let connector = FakeConnector::new();
        let conn = connector.connect("Mario Rossi").await.unwrap();
        let mut handle = connector.take_handle().unwrap();

        conn.send("hello".to_string()).await.unwrap();

        let sent = tokio::time::timeout(Duration::from_secs(2), handle.outbound_rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        assert_eq!(sent, "hello");
    }

    #[tokio::test]
    async fn test_injected_events_arrive_in_order() {
        let connector = FakeConnector::new();
        let conn = connector.connect("Mario Rossi").await.unwrap();
        let handle = connector.take_handle().unwrap();

        handle.events_tx.send(ChannelEvent::Opened).unwrap();
        handle
            .events_tx
            .send(ChannelEvent::Message("Bot: hi".to_string()))
            .unwrap();

        let mut stream = conn.events();
        assert_eq!(stream.next().await, Some(ChannelEvent::Opened));
        assert_eq!(
            stream.next().await,
            Some(ChannelEvent::Message("Bot: hi".to_string()))
        );
    }

    #[tokio::test]
    async fn test_scripted_connect_failure() {
        let connector = FakeConnector::new();
        connector.fail_next_connect();

        assert!(connector.connect("Mario Rossi").await.is_err());
        // The failure is one-shot.
        assert!(connector.connect("Mario Rossi").await.is_ok());
    }

    #[tokio::test]
    async fn test_identities_are_recorded() {
        let connector = FakeConnector::new();
        let _ = connector.connect("Mario Rossi").await.unwrap();
        let _ = connector.connect("Anna Bianchi").await.unwrap();

        assert_eq!(
            *connector.identities.lock().unwrap(),
            vec!["Mario Rossi".to_string(), "Anna Bianchi".to_string()]
        );
        assert_eq!(connector.connection_count(), 2);
    }

    #[tokio::test]
    async fn test_send_fails_after_handle_dropped() {
        let connector = FakeConnector::new();
        let conn = connector.connect("Mario Rossi").await.unwrap();
        drop(connector.take_handle());

        assert!(conn.send("hello".to_string()).await.is_err());
    }
}
