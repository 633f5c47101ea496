//! Duplex-connection abstraction for the chat channel
//!
//! This module defines the [`DuplexConnector`] and [`DuplexConnection`]
//! traits the session engine is written against. The concrete WebSocket
//! implementation lives in [`ws`]; an in-process fake for tests lives in
//! [`fake`].
//!
//! # Design
//!
//! Connection events are exposed as a consumable stream of typed
//! [`ChannelEvent`] values rather than registered callbacks, so the engine
//! demultiplexes exactly one ordered event sequence per connection. The
//! transport guarantees in-order delivery; no reordering logic exists at
//! this layer.

use std::fmt;
use std::pin::Pin;

use futures::Stream;

use crate::error::Result;

pub mod ws;

#[cfg(test)]
pub mod fake;

pub use ws::WsConnector;

/// Lifecycle state of the one live connection, owned by the session engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// A connection attempt is in flight or no Opened event has arrived yet
    Connecting,
    /// The channel is open; sends are accepted
    Open,
    /// The channel closed normally
    ClosedClean,
    /// The channel closed after a transport failure
    ClosedError,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::ClosedClean => write!(f, "closed"),
            Self::ClosedError => write!(f, "closed (error)"),
        }
    }
}

/// Why a connection closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Orderly close (close frame or end of stream)
    Clean,
    /// Transport failure, with the underlying error text
    Error(String),
}

/// One typed event from the duplex connection, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The connection completed its handshake and is ready to carry frames
    Opened,
    /// One inbound text frame (raw reply text, possibly `"Bot: "`-prefixed)
    Message(String),
    /// The connection is gone; no further events follow
    Closed {
        /// Whether the close was orderly or a failure
        reason: CloseReason,
    },
}

/// Opens duplex connections for an identity
///
/// A new `connect` call always produces a fresh, independent connection;
/// superseding and discarding the previous one is the engine's job.
#[async_trait::async_trait]
pub trait DuplexConnector: Send + Sync + fmt::Debug {
    /// Opens a connection whose address encodes `identity` as an opaque token
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CarelinkError::Channel`] when the handshake
    /// fails; the engine treats this like an error-close.
    async fn connect(&self, identity: &str) -> Result<Box<dyn DuplexConnection>>;
}

/// One live duplex connection
///
/// All methods are `async` or return pinned [`Stream`]s so implementations
/// can drive I/O without blocking the executor.
#[async_trait::async_trait]
pub trait DuplexConnection: Send + Sync + fmt::Debug {
    /// Transmits one raw user-message frame
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CarelinkError::Channel`] if the connection
    /// writer has shut down.
    async fn send(&self, text: String) -> Result<()>;

    /// Returns the stream of connection events, in arrival order
    ///
    /// The stream yields exactly one [`ChannelEvent::Closed`] as its final
    /// event and ends afterwards.
    fn events(&self) -> Pin<Box<dyn Stream<Item = ChannelEvent> + Send + '_>>;
}
