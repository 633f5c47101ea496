//! Carelink - conversational healthcare assistant client library
//!
//! This library provides the client half of a conversational healthcare
//! assistant: a persistent chat session over a duplex WebSocket channel,
//! history synchronization against the server-of-record, and a
//! document-upload flow whose analysis offer merges into the conversation.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: Timeline, history loader, pending-action coordinator, and
//!   the session engine tying them together
//! - `channel`: Duplex-connection abstraction and WebSocket implementation
//! - `api`: Backend collaborator endpoints (history, upload, analysis)
//! - `cache`: Persistent client-side session cache
//! - `documents`: Upload validation and lab-report classification
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use carelink::config::Config;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! config.validate()?;
//! // Session setup would go here
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod channel;
pub mod cli;
pub mod commands;
pub mod config;
pub mod documents;
pub mod error;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use error::{CarelinkError, Result};
pub use session::{Message, PendingAction, Role, SessionContext, SessionEngine, Timeline};
