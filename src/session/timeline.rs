//! Conversation timeline: the ordered log of exchanged turns
//!
//! The timeline is the single piece of mutable shared state in a session.
//! Every component mutates it only through the append/replace/filter
//! operations defined here, each of which is atomic within the engine's
//! single task. Entries are never reordered after append.

use serde::{Deserialize, Serialize};

/// Role of a timeline entry
///
/// The server speaks `"bot"` on the wire for assistant turns; the client
/// normalizes both spellings when deserializing history payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A turn typed by the patient
    User,
    /// A turn produced by the assistant (wire role `bot`)
    #[serde(alias = "bot")]
    Assistant,
}

/// A single conversation turn
///
/// A placeholder entry stands in for an assistant reply that is still in
/// flight; it carries no text until resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who produced this turn
    pub role: Role,
    /// The turn text (empty while a placeholder is unresolved)
    pub text: String,
    /// True while this entry stands in for an in-flight assistant reply
    #[serde(default)]
    pub placeholder: bool,
}

impl Message {
    /// Creates a user turn
    ///
    /// # Examples
    ///
    /// ```
    /// use carelink::session::timeline::{Message, Role};
    ///
    /// let msg = Message::user("I have a headache");
    /// assert_eq!(msg.role, Role::User);
    /// assert!(!msg.placeholder);
    /// ```
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            placeholder: false,
        }
    }

    /// Creates a resolved assistant turn
    ///
    /// # Examples
    ///
    /// ```
    /// use carelink::session::timeline::{Message, Role};
    ///
    /// let msg = Message::assistant("You should rest and hydrate.");
    /// assert_eq!(msg.role, Role::Assistant);
    /// ```
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            placeholder: false,
        }
    }

    /// Creates an unresolved assistant placeholder
    ///
    /// The placeholder carries no text; it is replaced in place when the
    /// corresponding reply arrives.
    pub fn placeholder() -> Self {
        Self {
            role: Role::Assistant,
            text: String::new(),
            placeholder: true,
        }
    }
}

/// The ordered, in-memory log of exchanged turns
///
/// Exposed to rendering read-only and mutated only by the session engine.
/// At most one unresolved placeholder exists at any time: the input control
/// is gated while an assistant reply is pending, so two simultaneous
/// in-flight chat sends cannot occur.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    entries: Vec<Message>,
}

impl Timeline {
    /// Creates an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a timeline from already-normalized history messages
    pub fn from_messages(entries: Vec<Message>) -> Self {
        Self { entries }
    }

    /// Appends a user turn
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.entries.push(Message::user(text));
    }

    /// Appends a resolved assistant turn
    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.entries.push(Message::assistant(text));
    }

    /// Appends an unresolved assistant placeholder
    pub fn push_placeholder(&mut self) {
        self.entries.push(Message::placeholder());
    }

    /// Resolves the most recent unresolved placeholder, or appends
    ///
    /// Scans from the tail for an unresolved placeholder and replaces it in
    /// place (the timeline length is unchanged by resolution). When no
    /// placeholder is outstanding the text is appended as a new assistant
    /// turn. Returns true if a placeholder was resolved.
    ///
    /// # Examples
    ///
    /// ```
    /// use carelink::session::timeline::Timeline;
    ///
    /// let mut timeline = Timeline::new();
    /// timeline.push_user("hello");
    /// timeline.push_placeholder();
    /// assert!(timeline.resolve_placeholder("hi there"));
    /// assert_eq!(timeline.len(), 2);
    /// assert_eq!(timeline.messages()[1].text, "hi there");
    /// ```
    pub fn resolve_placeholder(&mut self, text: impl Into<String>) -> bool {
        if let Some(entry) = self.entries.iter_mut().rev().find(|m| m.placeholder) {
            entry.text = text.into();
            entry.placeholder = false;
            true
        } else {
            self.entries.push(Message::assistant(text));
            false
        }
    }

    /// Removes every unresolved placeholder
    ///
    /// Used when a send fails locally so the UI does not hang on a
    /// "thinking" indicator that can never resolve.
    pub fn remove_placeholders(&mut self) {
        self.entries.retain(|m| !m.placeholder);
    }

    /// True if an unresolved placeholder is outstanding
    pub fn has_placeholder(&self) -> bool {
        self.entries.iter().any(|m| m.placeholder)
    }

    /// Returns all entries in insertion order
    pub fn messages(&self) -> &[Message] {
        &self.entries
    }

    /// Returns the number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the timeline has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
