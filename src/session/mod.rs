//! Conversational session engine
//!
//! This module owns the in-session state: the conversation timeline, the
//! history loader that synchronizes it against the server-of-record, the
//! pending-action coordinator for document-analysis offers, and the engine
//! that ties them to the duplex channel and the backend endpoints.

pub mod engine;
pub mod history;
pub mod metrics;
pub mod pending;
pub mod timeline;

pub use engine::SessionEngine;
pub use pending::{PendingAction, PendingCoordinator, ReplyRouting};
pub use timeline::{Message, Role, Timeline};

/// Per-session identity context
///
/// An explicit context object passed into the engine rather than a
/// module-level singleton, so multiple sessions (and tests) can coexist in
/// one process. The identity is set by the history load and falls back to
/// the configured default while the server has not answered.
#[derive(Debug, Clone)]
pub struct SessionContext {
    identity: Option<String>,
    default_identity: String,
}

impl SessionContext {
    /// Creates a context with no authenticated identity yet
    ///
    /// # Examples
    ///
    /// ```
    /// use carelink::session::SessionContext;
    ///
    /// let ctx = SessionContext::new("Guest");
    /// assert_eq!(ctx.identity(), "Guest");
    /// ```
    pub fn new(default_identity: impl Into<String>) -> Self {
        Self {
            identity: None,
            default_identity: default_identity.into(),
        }
    }

    /// The effective identity: authenticated when known, default otherwise
    pub fn identity(&self) -> &str {
        self.identity.as_deref().unwrap_or(&self.default_identity)
    }

    /// The authenticated identity, if the history load established one
    pub fn authenticated_identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Records the authenticated identity
    pub fn set_identity(&mut self, identity: impl Into<String>) {
        self.identity = Some(identity.into());
    }

    /// Forgets the authenticated identity (sign-out)
    pub fn clear_identity(&mut self) {
        self.identity = None;
    }
}
