//! Backend collaborator interface
//!
//! This module defines the [`BackendApi`] trait covering the one-shot HTTP
//! endpoints the session engine consumes, along with the wire types for
//! their payloads. The concrete implementation lives in [`client`]; an
//! in-process fake for tests lives in [`fake`].
//!
//! The backend is opaque to this crate: history, upload, and analysis are
//! plain request/response collaborators, and the assistant's own reasoning
//! is invoked as a black-box text-in/text-out service behind them.

use crate::error::Result;
use crate::session::timeline::{Message, Role};
use serde::{Deserialize, Serialize};

pub mod client;

#[cfg(test)]
pub mod fake;

pub use client::HttpBackend;

/// One message as the history endpoint serializes it
///
/// The server speaks `"user"` / `"bot"` roles and attaches an optional
/// timestamp the client does not use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    /// Wire role: `"user"` or `"bot"`
    pub role: String,
    /// Message text
    pub text: String,
    /// Server-side timestamp, ignored by the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl WireMessage {
    /// Normalizes a wire message into a timeline [`Message`]
    ///
    /// Any role other than `"user"` is treated as the assistant; the server
    /// only ever emits the two.
    pub fn normalize(self) -> Message {
        let role = if self.role == "user" {
            Role::User
        } else {
            Role::Assistant
        };
        Message {
            role,
            text: self.text,
            placeholder: false,
        }
    }
}

/// Payload of `GET /api/chat-history`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Authenticated identity the history belongs to
    pub user_name: String,
    /// Full stored conversation, oldest first
    #[serde(default)]
    pub messages: Vec<WireMessage>,
}

/// Payload of a successful `POST /api/upload-document`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Server-assigned unique filename
    pub filename: String,
    /// Server-side path used as the analysis subject reference
    pub file_path: String,
    /// Row id of the stored document record
    #[serde(default)]
    pub document_id: Option<i64>,
    /// Human-readable status message
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload of `POST /api/analyze-lab-report`
///
/// The body is decoded regardless of the HTTP status: a rejected request
/// carries `error` instead of `analysis`, and the caller falls back to a
/// fixed phrase when `analysis` is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// The produced analysis text, when the request was accepted
    #[serde(default)]
    pub analysis: Option<String>,
    /// Server-reported failure reason, when it was not
    #[serde(default)]
    pub error: Option<String>,
}

/// The one-shot HTTP endpoints consumed by the session engine
///
/// All requests are session-authenticated; the configured cookie is sent
/// verbatim (cookie acquisition itself is outside this crate).
#[async_trait::async_trait]
pub trait BackendApi: Send + Sync + std::fmt::Debug {
    /// Fetches the authoritative conversation history for the current identity
    async fn fetch_history(&self) -> Result<HistoryResponse>;

    /// Uploads one document with a free-text description
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CarelinkError::Backend`] carrying the
    /// server-reported `error` field on a non-success status, or the
    /// transport error on network failure.
    async fn upload_document(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        description: &str,
    ) -> Result<UploadResponse>;

    /// Requests analysis of a previously uploaded document
    ///
    /// Decodes the body on any HTTP status; only transport or decoding
    /// failures surface as errors.
    async fn analyze_document(&self, file_path: &str) -> Result<AnalysisResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_message_normalizes_user_role() {
        let wire = WireMessage {
            role: "user".to_string(),
            text: "hello".to_string(),
            timestamp: None,
        };
        let msg = wire.normalize();
        assert_eq!(msg.role, Role::User);
        assert!(!msg.placeholder);
    }

    #[test]
    fn test_wire_message_normalizes_bot_role() {
        let wire = WireMessage {
            role: "bot".to_string(),
            text: "hi".to_string(),
            timestamp: Some("01-02-2026 10:00:00".to_string()),
        };
        assert_eq!(wire.normalize().role, Role::Assistant);
    }

    #[test]
    fn test_history_response_tolerates_missing_messages() {
        let resp: HistoryResponse = serde_json::from_str(r#"{"user_name":"Mario Rossi"}"#).unwrap();
        assert_eq!(resp.user_name, "Mario Rossi");
        assert!(resp.messages.is_empty());
    }

    #[test]
    fn test_analysis_response_decodes_error_body() {
        let resp: AnalysisResponse =
            serde_json::from_str(r#"{"error":"Only PDF files can be analyzed"}"#).unwrap();
        assert!(resp.analysis.is_none());
        assert_eq!(resp.error.as_deref(), Some("Only PDF files can be analyzed"));
    }
}
