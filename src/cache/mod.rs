//! Client-side session cache surviving restarts
//!
//! Stores the last-known identity and message list in an embedded `sled`
//! key-value database. The cache is a resilience fallback only: the server
//! history endpoint is authoritative, and cached content is valid only while
//! its associated identity matches the identity of the active session.

use crate::error::{CarelinkError, Result};
use crate::session::timeline::Message;
use directories::ProjectDirs;
use sled::Db;
use std::path::PathBuf;

/// Key under which the last-known identity string is stored
const IDENTITY_KEY: &str = "identity";

/// Key under which the last-known message list (JSON array) is stored
const MESSAGES_KEY: &str = "messages";

/// Key recording when the cache was last mirrored (RFC-3339)
const SAVED_AT_KEY: &str = "saved_at";

/// Persistent key-value cache for the active session
///
/// Both stored values are invalidated together on sign-out or identity
/// mismatch; the cache never outlives the identity it was written under.
///
/// # Examples
///
/// ```
/// use carelink::cache::SessionCache;
/// use carelink::session::timeline::Message;
///
/// # fn main() -> carelink::error::Result<()> {
/// let dir = std::env::temp_dir().join("carelink-cache-doc");
/// let cache = SessionCache::open_at(&dir)?;
/// cache.store("Mario Rossi", &[Message::user("hello")])?;
/// assert_eq!(cache.cached_identity()?.as_deref(), Some("Mario Rossi"));
/// # cache.clear()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SessionCache {
    db: Db,
}

impl SessionCache {
    /// Opens the cache in the user's data directory
    ///
    /// The location can be overridden with the `CARELINK_CACHE_DIR`
    /// environment variable, which makes it easy to point the binary at a
    /// test directory without touching the user's application data.
    pub fn open() -> Result<Self> {
        if let Ok(override_dir) = std::env::var("CARELINK_CACHE_DIR") {
            return Self::open_at(override_dir);
        }

        let proj_dirs = ProjectDirs::from("com", "carelink", "carelink")
            .ok_or_else(|| CarelinkError::Cache("Could not determine data directory".into()))?;
        Self::open_at(proj_dirs.data_dir().join("session-cache"))
    }

    /// Opens the cache at a specific directory
    ///
    /// Primarily useful for tests where the default application data
    /// directory is not desirable.
    pub fn open_at<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path: PathBuf = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CarelinkError::Cache(format!("Failed to create cache parent: {}", e)))?;
        }
        let db = sled::open(&path)
            .map_err(|e| CarelinkError::Cache(format!("Failed to open cache: {}", e)))?;
        Ok(Self { db })
    }

    /// Returns the identity the cached messages belong to, if any
    pub fn cached_identity(&self) -> Result<Option<String>> {
        match self
            .db
            .get(IDENTITY_KEY)
            .map_err(|e| CarelinkError::Cache(format!("Get failed: {}", e)))?
        {
            Some(bytes) => {
                let identity = String::from_utf8(bytes.to_vec())
                    .map_err(|e| CarelinkError::Cache(format!("Corrupt identity: {}", e)))?;
                Ok(Some(identity))
            }
            None => Ok(None),
        }
    }

    /// Returns the cached message list, or an empty list when absent
    pub fn cached_messages(&self) -> Result<Vec<Message>> {
        match self
            .db
            .get(MESSAGES_KEY)
            .map_err(|e| CarelinkError::Cache(format!("Get failed: {}", e)))?
        {
            Some(bytes) => {
                let messages = serde_json::from_slice(&bytes)
                    .map_err(|e| CarelinkError::Cache(format!("Corrupt messages: {}", e)))?;
                Ok(messages)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Writes identity and messages together
    ///
    /// Mirroring always writes the pair: cached messages without an owning
    /// identity could never be validated on the next load.
    pub fn store(&self, identity: &str, messages: &[Message]) -> Result<()> {
        let payload = serde_json::to_vec(messages)
            .map_err(|e| CarelinkError::Cache(format!("Serialization failed: {}", e)))?;

        self.db
            .insert(IDENTITY_KEY, identity.as_bytes())
            .map_err(|e| CarelinkError::Cache(format!("Insert failed: {}", e)))?;
        self.db
            .insert(MESSAGES_KEY, payload)
            .map_err(|e| CarelinkError::Cache(format!("Insert failed: {}", e)))?;
        self.db
            .insert(SAVED_AT_KEY, chrono::Utc::now().to_rfc3339().as_bytes())
            .map_err(|e| CarelinkError::Cache(format!("Insert failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| CarelinkError::Cache(format!("Flush failed: {}", e)))?;

        Ok(())
    }

    /// Removes identity, messages, and bookkeeping together
    pub fn clear(&self) -> Result<()> {
        for key in [IDENTITY_KEY, MESSAGES_KEY, SAVED_AT_KEY] {
            self.db
                .remove(key)
                .map_err(|e| CarelinkError::Cache(format!("Remove failed: {}", e)))?;
        }
        self.db
            .flush()
            .map_err(|e| CarelinkError::Cache(format!("Flush failed: {}", e)))?;
        Ok(())
    }

}
