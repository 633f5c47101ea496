//! Error types for Carelink
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Carelink operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, backend requests, duplex-channel I/O, document
/// intake, and cache operations.
#[derive(Error, Debug)]
pub enum CarelinkError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend collaborator errors (bad status, error body, malformed reply)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Duplex channel errors (connect, send, frame handling)
    #[error("Channel error: {0}")]
    Channel(String),

    /// Send attempted while the channel is not in the Open state
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// Document intake errors (unreadable file, rejected submission)
    #[error("Document error: {0}")]
    Document(String),

    /// Uploaded file exceeds the size ceiling
    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge {
        /// Actual size of the rejected file
        size: u64,
        /// The configured ceiling
        limit: u64,
    },

    /// Session cache errors (sled operations, serialization of cached state)
    #[error("Cache error: {0}")]
    Cache(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Carelink operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
