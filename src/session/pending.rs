//! Pending-action coordinator for document-analysis offers
//!
//! A one-slot state machine tracking whether the last assistant turn was a
//! "confirm or decline" offer to analyze an uploaded lab report. The next
//! user free-text reply is intercepted and classified so a single message
//! can either answer the offer or continue the chat.

use std::fmt;

/// Affirmative vocabulary for the confirmation reply
///
/// A reply counts as affirmative if it case-insensitively contains any of
/// these tokens. The deployment serves Italian-speaking patients, so the
/// vocabulary carries both languages.
const AFFIRMATIVE_TOKENS: &[&str] = &[
    "yes", "yeah", "yep", "okay", "ok", "sure", "please", "confirm", "analyze", "sì", "va bene",
    "certo", "analizza",
];

/// Rejection vocabulary for the confirmation reply
const REJECTION_TOKENS: &[&str] = &[
    "no", "nope", "nah", "don't", "cancel", "skip", "later", "non voglio", "niente",
];

/// The single outstanding document-analysis offer, if any
///
/// At most one pending action exists at a time. It is created only by a
/// successful lab-report upload and destroyed by the next user turn
/// regardless of how that turn is classified.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PendingAction {
    /// No offer is outstanding
    #[default]
    Idle,
    /// An analysis offer is awaiting the user's next reply
    AwaitingConfirmation {
        /// Opaque server-side reference to the uploaded document
        subject_ref: String,
    },
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitingConfirmation { .. } => write!(f, "awaiting confirmation"),
        }
    }
}

/// Where the next user reply is routed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyRouting {
    /// Affirmative reply: issue one analysis request for the referenced document
    Analyze {
        /// The document reference captured when the offer was made
        subject_ref: String,
    },
    /// Rejecting reply: acknowledge and do nothing else
    Decline,
    /// Neither vocabulary matched (or nothing was pending): ordinary chat turn
    Fallthrough,
}

/// One-slot coordinator between document intake and the chat send path
///
/// The coordinator never holds a network connection; it only decides which
/// path a given piece of user text takes next.
///
/// # Examples
///
/// ```
/// use carelink::session::pending::{PendingCoordinator, ReplyRouting};
///
/// let mut pending = PendingCoordinator::new();
/// pending.offer("uploads/report.pdf");
/// match pending.route_reply("yes please") {
///     ReplyRouting::Analyze { subject_ref } => assert_eq!(subject_ref, "uploads/report.pdf"),
///     other => panic!("expected analyze, got {:?}", other),
/// }
/// assert!(!pending.is_awaiting());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PendingCoordinator {
    state: PendingAction,
}

impl PendingCoordinator {
    /// Creates a coordinator with an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new analysis offer
    ///
    /// Only the most recent offer is actionable: an upload that arrives
    /// while another offer is outstanding overwrites the reference
    /// (last-offer-wins).
    pub fn offer(&mut self, subject_ref: impl Into<String>) {
        let subject_ref = subject_ref.into();
        if let PendingAction::AwaitingConfirmation { subject_ref: old } = &self.state {
            tracing::debug!(superseded = %old, "replacing outstanding analysis offer");
        }
        self.state = PendingAction::AwaitingConfirmation { subject_ref };
    }

    /// True while an offer is awaiting the user's next reply
    pub fn is_awaiting(&self) -> bool {
        matches!(self.state, PendingAction::AwaitingConfirmation { .. })
    }

    /// Returns the current slot state
    pub fn state(&self) -> &PendingAction {
        &self.state
    }

    /// Classifies the next user reply and empties the slot
    ///
    /// The slot is cleared in every branch: an affirmative reply routes to
    /// the analysis request, a rejecting reply routes to the fixed
    /// acknowledgement, and anything else falls through to the normal chat
    /// path. The affirmative check runs first, so a reply matching both
    /// vocabularies ("yes, but no rush") is treated as affirmative.
    pub fn route_reply(&mut self, reply: &str) -> ReplyRouting {
        match std::mem::take(&mut self.state) {
            PendingAction::Idle => ReplyRouting::Fallthrough,
            PendingAction::AwaitingConfirmation { subject_ref } => {
                let normalized = reply.to_lowercase();
                if contains_any(&normalized, AFFIRMATIVE_TOKENS) {
                    ReplyRouting::Analyze { subject_ref }
                } else if contains_any(&normalized, REJECTION_TOKENS) {
                    ReplyRouting::Decline
                } else {
                    ReplyRouting::Fallthrough
                }
            }
        }
    }
}

/// True if `normalized` contains any of the given lowercase tokens
fn contains_any(normalized: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|token| normalized.contains(token))
}
