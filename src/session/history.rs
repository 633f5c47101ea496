//! History synchronization against the server-of-record
//!
//! On session start the loader issues one authenticated history request and
//! reconciles the result with the persistent cache. The server is
//! authoritative; the cache only ever holds a mirror, and a mirror written
//! under one identity must never surface under another. The identity check
//! runs even though the server is authoritative because the cache write
//! happens client-side: a slow reply for user A landing after user B signed
//! in on the same device must not resurrect A's messages under B.

use crate::api::BackendApi;
use crate::cache::SessionCache;
use crate::session::timeline::Timeline;

/// What the load established
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// The authenticated identity, when the server answered
    pub identity: Option<String>,
    /// Number of history messages loaded into the timeline
    pub message_count: usize,
}

/// Fetches authoritative history and reconciles cache and timeline
///
/// Failure and empty history both leave the timeline empty and clear the
/// cache (stale history must never be shown); an empty chat is a valid
/// degraded state, so no error propagates. On success the timeline and
/// cache are populated together, after purging any cache written under a
/// different identity.
pub async fn load(
    backend: &dyn BackendApi,
    cache: &SessionCache,
    timeline: &mut Timeline,
) -> LoadOutcome {
    let response = match backend.fetch_history().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "history fetch failed; starting with an empty timeline");
            clear_cache(cache);
            return LoadOutcome {
                identity: None,
                message_count: 0,
            };
        }
    };

    if response.messages.is_empty() {
        tracing::info!(identity = %response.user_name, "no stored history for this identity");
        clear_cache(cache);
        return LoadOutcome {
            identity: Some(response.user_name),
            message_count: 0,
        };
    }

    match cache.cached_identity() {
        Ok(Some(cached)) if cached != response.user_name => {
            tracing::info!(
                cached = %cached,
                current = %response.user_name,
                "cached history belongs to a different identity; purging"
            );
            clear_cache(cache);
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "cache identity unreadable; purging");
            clear_cache(cache);
        }
    }

    let messages: Vec<_> = response
        .messages
        .into_iter()
        .map(|wire| wire.normalize())
        .collect();
    let message_count = messages.len();

    if let Err(e) = cache.store(&response.user_name, &messages) {
        tracing::warn!(error = %e, "failed to mirror loaded history into the cache");
    }
    *timeline = Timeline::from_messages(messages);

    LoadOutcome {
        identity: Some(response.user_name),
        message_count,
    }
}

/// Best-effort cache purge; failures are logged, never propagated
fn clear_cache(cache: &SessionCache) {
    if let Err(e) = cache.clear() {
        tracing::warn!(error = %e, "failed to clear the session cache");
    }
}
