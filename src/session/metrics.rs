//! Session telemetry counters
//!
//! Thin wrappers over the `metrics` macros so call sites stay one line and
//! metric names live in a single place. An exporter (e.g. the optional
//! Prometheus recorder) can be installed by the embedding application.

use metrics::{gauge, increment_counter};

/// Records one successful duplex connect
pub fn record_connect() {
    increment_counter!("session_connects_total");
}

/// Records one user chat message handed to the channel
pub fn record_message_sent() {
    increment_counter!("session_messages_sent_total");
}

/// Records one inbound assistant message applied to the timeline
pub fn record_message_received() {
    increment_counter!("session_messages_received_total");
}

/// Records one document upload attempt by outcome
///
/// `status` is one of `ok`, `rejected`, `error`.
pub fn record_upload(status: &str) {
    increment_counter!("session_uploads_total", "status" => status.to_string());
}

/// Records one analysis request by outcome (`ok` or `error`)
pub fn record_analysis(status: &str) {
    increment_counter!("session_analyses_total", "status" => status.to_string());
}

/// Mirrors the availability indicator as a gauge
pub fn set_channel_available(available: bool) {
    gauge!(
        "session_channel_available",
        if available { 1.0 } else { 0.0 }
    );
}
