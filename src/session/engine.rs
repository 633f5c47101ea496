//! The session engine: glue between timeline, cache, channel, and backend
//!
//! The engine owns the one live duplex connection and the timeline, the
//! single piece of mutable shared state. Every mutation happens on the
//! engine's own task; the only suspension points are the network
//! operations. Events from superseded connections are identified by a
//! generation counter and dropped, so a reconnect can simply abandon the
//! old connection without transport-level cancellation.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_stream::StreamExt;

use crate::api::BackendApi;
use crate::cache::SessionCache;
use crate::channel::{ChannelEvent, CloseReason, ConnectionState, DuplexConnection, DuplexConnector};
use crate::documents::{self, DocumentIntake};
use crate::error::CarelinkError;
use crate::session::pending::{PendingCoordinator, ReplyRouting};
use crate::session::timeline::Timeline;
use crate::session::{history, metrics, SessionContext};

/// Literal tag the backend prefixes onto some replies; stripped on receipt
const BOT_PREFIX: &str = "Bot: ";

/// Synthetic turn for an error-close
const CONNECTION_ERROR_TEXT: &str =
    "Connection error - please reload the session to reconnect.";

/// Synthetic turn for an unexpected orderly close
const CONNECTION_LOST_TEXT: &str = "Connection lost - please reload the session to reconnect.";

/// Error turn when a send is attempted off an open channel
const NOT_CONNECTED_TEXT: &str =
    "Message could not be sent because the connection is not open. Please reload and try again.";

/// Acknowledgement for a declined analysis offer
const DECLINE_ACK_TEXT: &str =
    "Alright, I won't analyze it. The document stays in your record. Anything else I can help with?";

/// Resolution text when the analysis endpoint returns no analysis field
const ANALYSIS_FALLBACK_TEXT: &str = "The report was processed but no analysis was returned.";

/// Notice when a second upload is attempted while one is in flight
const UPLOAD_BUSY_TEXT: &str =
    "An upload is already in progress. Please wait for it to finish.";

/// The conversational session engine
///
/// Construct with [`SessionEngine::new`], call [`SessionEngine::start`]
/// once, then feed it user turns via [`SessionEngine::send_user_message`]
/// and drain channel events via [`SessionEngine::recv_event`]. The
/// timeline is the render surface; callers read it after every call.
pub struct SessionEngine {
    context: SessionContext,
    backend: Arc<dyn BackendApi>,
    connector: Arc<dyn DuplexConnector>,
    cache: SessionCache,
    timeline: Timeline,
    pending: PendingCoordinator,
    intake: DocumentIntake,
    state: ConnectionState,
    available: bool,
    loaded: bool,
    /// Bumped on every connect/teardown; events tagged with an older value
    /// belong to a superseded connection and are dropped.
    generation: u64,
    /// Guards the one-synthetic-turn-per-close rule.
    close_reported: bool,
    connection: Option<Arc<dyn DuplexConnection>>,
    events_tx: mpsc::UnboundedSender<(u64, ChannelEvent)>,
    events_rx: mpsc::UnboundedReceiver<(u64, ChannelEvent)>,
}

impl SessionEngine {
    /// Creates an engine that has not loaded history or connected yet
    pub fn new(
        context: SessionContext,
        backend: Arc<dyn BackendApi>,
        connector: Arc<dyn DuplexConnector>,
        cache: SessionCache,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            context,
            backend,
            connector,
            cache,
            timeline: Timeline::new(),
            pending: PendingCoordinator::new(),
            intake: DocumentIntake::new(),
            state: ConnectionState::ClosedClean,
            available: false,
            loaded: false,
            generation: 0,
            close_reported: false,
            connection: None,
            events_tx,
            events_rx,
        }
    }

    /// Starts the session: one history load, then one connect
    ///
    /// Never fails; a failed history load degrades to an empty timeline and
    /// a failed connect to a visible connection-error turn.
    pub async fn start(&mut self) {
        let outcome = history::load(&*self.backend, &self.cache, &mut self.timeline).await;
        if let Some(identity) = outcome.identity {
            self.context.set_identity(identity);
        }
        self.loaded = true;
        tracing::info!(
            identity = %self.context.identity(),
            messages = outcome.message_count,
            "session history loaded"
        );
        self.connect().await;
    }

    /// Opens a fresh connection, superseding and discarding any previous one
    ///
    /// The old connection's pump keeps its stale generation tag, so its
    /// remaining events are silently dropped rather than cancelled.
    pub async fn connect(&mut self) {
        self.generation += 1;
        self.connection = None;
        self.close_reported = false;
        self.state = ConnectionState::Connecting;
        self.set_available(false);

        let identity = self.context.identity().to_string();
        match self.connector.connect(&identity).await {
            Ok(boxed) => {
                let connection: Arc<dyn DuplexConnection> = Arc::from(boxed);
                let pump = Arc::clone(&connection);
                let events_tx = self.events_tx.clone();
                let generation = self.generation;
                tokio::spawn(async move {
                    let mut events = pump.events();
                    while let Some(event) = events.next().await {
                        if events_tx.send((generation, event)).is_err() {
                            break;
                        }
                    }
                });
                self.connection = Some(connection);
                metrics::record_connect();
            }
            Err(e) => {
                tracing::warn!(error = %e, "duplex connect failed");
                self.state = ConnectionState::ClosedError;
                self.report_close(CONNECTION_ERROR_TEXT);
            }
        }
    }

    /// Switches identity and reconnects exactly once
    ///
    /// A no-op when the identity is unchanged.
    pub async fn set_identity(&mut self, identity: &str) {
        if self.context.identity() == identity {
            return;
        }
        self.context.set_identity(identity);
        self.connect().await;
    }

    /// Signs out: identity and cache are cleared together
    pub fn sign_out(&mut self) {
        self.generation += 1;
        self.connection = None;
        self.state = ConnectionState::ClosedClean;
        self.set_available(false);
        self.context.clear_identity();
        self.timeline.clear();
        if let Err(e) = self.cache.clear() {
            tracing::warn!(error = %e, "failed to clear the cache on sign-out");
        }
    }

    /// Waits for the next event from the live connection and applies it
    ///
    /// Events from superseded connections are skipped. Pends indefinitely
    /// while no connection is delivering, so it composes with `select!`.
    pub async fn recv_event(&mut self) -> Option<ChannelEvent> {
        loop {
            let (generation, event) = self.events_rx.recv().await?;
            if generation != self.generation {
                tracing::debug!(?event, "dropping event from a superseded connection");
                continue;
            }
            self.apply_event(&event);
            return Some(event);
        }
    }

    /// Applies one channel event to the session state
    fn apply_event(&mut self, event: &ChannelEvent) {
        match event {
            ChannelEvent::Opened => {
                self.state = ConnectionState::Open;
                self.close_reported = false;
                self.set_available(true);
                tracing::info!("duplex channel open");
            }
            ChannelEvent::Message(raw) => {
                let text = raw.strip_prefix(BOT_PREFIX).unwrap_or(raw);
                self.timeline.resolve_placeholder(text);
                metrics::record_message_received();
                self.mirror_cache();
            }
            ChannelEvent::Closed { reason } => {
                self.set_available(false);
                let text = match reason {
                    CloseReason::Clean => {
                        self.state = ConnectionState::ClosedClean;
                        CONNECTION_LOST_TEXT
                    }
                    CloseReason::Error(detail) => {
                        tracing::warn!(%detail, "duplex channel failed");
                        self.state = ConnectionState::ClosedError;
                        CONNECTION_ERROR_TEXT
                    }
                };
                // The stale placeholder, if any, stays in the timeline
                // alongside the notice; see DESIGN.md.
                self.report_close(text);
            }
        }
    }

    /// Routes one user free-text turn
    ///
    /// The pending-action coordinator classifies the turn first; whatever
    /// the branch, the pending slot is empty afterwards.
    pub async fn send_user_message(&mut self, text: &str) {
        match self.pending.route_reply(text) {
            ReplyRouting::Analyze { subject_ref } => self.run_analysis(text, &subject_ref).await,
            ReplyRouting::Decline => {
                self.timeline.push_user(text);
                self.timeline.push_assistant(DECLINE_ACK_TEXT);
                self.mirror_cache();
            }
            ReplyRouting::Fallthrough => self.send_chat_turn(text).await,
        }
    }

    /// Normal chat path: append, then attempt the duplex send
    async fn send_chat_turn(&mut self, text: &str) {
        // The user turn lands before the send is even attempted, so the
        // visible ordering never depends on send latency or failure.
        self.timeline.push_user(text);
        self.timeline.push_placeholder();

        let result = match (&self.state, self.connection.clone()) {
            (ConnectionState::Open, Some(connection)) => connection.send(text.to_string()).await,
            (state, _) => Err(CarelinkError::NotConnected(format!("channel is {}", state)).into()),
        };

        match result {
            Ok(()) => metrics::record_message_sent(),
            Err(e) => {
                tracing::warn!(error = %e, "chat send failed");
                self.timeline.remove_placeholders();
                self.timeline.push_assistant(NOT_CONNECTED_TEXT);
            }
        }
        self.mirror_cache();
    }

    /// ANALYZE branch: one analysis request against the offered document
    async fn run_analysis(&mut self, reply: &str, subject_ref: &str) {
        self.timeline.push_user(reply);
        self.timeline.push_placeholder();

        match self.backend.analyze_document(subject_ref).await {
            Ok(response) => {
                let text = response
                    .analysis
                    .unwrap_or_else(|| ANALYSIS_FALLBACK_TEXT.to_string());
                self.timeline.resolve_placeholder(text);
                metrics::record_analysis("ok");
            }
            Err(e) => {
                self.timeline
                    .resolve_placeholder(format!("Lab report analysis failed: {}", e));
                metrics::record_analysis("error");
            }
        }
        self.mirror_cache();
    }

    /// Uploads one document; a lab report arms the analysis offer
    pub async fn upload_document(&mut self, path: &Path, description: &str) {
        if !self.intake.begin() {
            self.timeline.push_assistant(UPLOAD_BUSY_TEXT);
            return;
        }
        self.perform_upload(path, description).await;
        self.intake.finish();
        self.mirror_cache();
    }

    async fn perform_upload(&mut self, path: &Path, description: &str) {
        let submission = match documents::prepare(path, description).await {
            Ok(submission) => submission,
            Err(e) => {
                let text = match e.downcast_ref::<CarelinkError>() {
                    Some(CarelinkError::FileTooLarge { size, limit }) => format!(
                        "\"{}\" was not uploaded: {} exceeds the {} limit.",
                        path.file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_else(|| path.display().to_string()),
                        documents::format_size(*size),
                        documents::format_size(*limit),
                    ),
                    _ => format!("Document upload failed: {}", e),
                };
                self.timeline.push_assistant(text);
                metrics::record_upload("rejected");
                return;
            }
        };

        let file_name = submission.file_name.clone();
        match self
            .backend
            .upload_document(&file_name, submission.bytes, &submission.description)
            .await
        {
            Ok(response) => {
                if documents::is_lab_report(&file_name) {
                    self.pending.offer(response.file_path);
                    self.timeline.push_assistant(format!(
                        "I received your lab report \"{}\". Would you like me to analyze it?",
                        file_name
                    ));
                } else {
                    self.timeline.push_assistant(format!(
                        "Your document \"{}\" has been uploaded and saved to your record.",
                        file_name
                    ));
                }
                metrics::record_upload("ok");
            }
            Err(e) => {
                self.timeline
                    .push_assistant(format!("Document upload failed: {}", e));
                metrics::record_upload("error");
            }
        }
    }

    /// Appends the synthetic close turn at most once per connection
    fn report_close(&mut self, text: &str) {
        if self.close_reported {
            return;
        }
        self.close_reported = true;
        self.timeline.push_assistant(text);
        self.mirror_cache();
    }

    /// Mirrors the timeline into the cache whenever it is non-empty
    fn mirror_cache(&self) {
        if !self.loaded || self.timeline.is_empty() {
            return;
        }
        if let Err(e) = self
            .cache
            .store(self.context.identity(), self.timeline.messages())
        {
            tracing::warn!(error = %e, "cache mirror failed");
        }
    }

    fn set_available(&mut self, available: bool) {
        self.available = available;
        metrics::set_channel_available(available);
    }

    /// The conversation timeline, for rendering
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// The availability indicator
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Current connection lifecycle state
    pub fn connection_state(&self) -> &ConnectionState {
        &self.state
    }

    /// True while a document-analysis offer awaits the next reply
    pub fn is_awaiting_confirmation(&self) -> bool {
        self.pending.is_awaiting()
    }

    /// The effective identity of this session
    pub fn identity(&self) -> &str {
        self.context.identity()
    }
}

impl std::fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("identity", &self.context.identity())
            .field("state", &self.state)
            .field("timeline_len", &self.timeline.len())
            .field("pending", &self.pending.state())
            .finish()
    }
}
