//! Configuration management for Carelink
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{CarelinkError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for Carelink
///
/// Holds the backend collaborator endpoints and session behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend endpoint configuration
    #[serde(default)]
    pub backend: BackendConfig,
    /// Session behavior configuration
    #[serde(default)]
    pub session: SessionConfig,
}

/// Backend endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Origin for the one-shot HTTP endpoints
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Duplex channel endpoint (the identity is appended as a query parameter)
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// Per-request timeout for the HTTP endpoints (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Session cookie sent verbatim on every HTTP request, when already held
    ///
    /// Acquiring the cookie (login) happens outside this client.
    #[serde(default)]
    pub auth_cookie: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_ws_url() -> String {
    "ws://localhost:5000/ws".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_url: default_ws_url(),
            timeout_seconds: default_timeout(),
            auth_cookie: None,
        }
    }
}

impl BackendConfig {
    /// The HTTP origin as a parsed URL
    pub fn base_url(&self) -> Result<url::Url> {
        url::Url::parse(&self.base_url)
            .map_err(|e| CarelinkError::Config(format!("Invalid base_url: {}", e)).into())
    }

    /// The channel endpoint as a parsed URL
    pub fn ws_url(&self) -> Result<url::Url> {
        url::Url::parse(&self.ws_url)
            .map_err(|e| CarelinkError::Config(format!("Invalid ws_url: {}", e)).into())
    }

    /// The per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Session behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Identity used while the history endpoint has not answered
    #[serde(default = "default_identity")]
    pub default_identity: String,
}

fn default_identity() -> String {
    "Guest".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_identity: default_identity(),
        }
    }
}

impl Config {
    /// Load configuration from a file with env and CLI overrides applied
    ///
    /// Falls back to defaults when the file does not exist.
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CarelinkError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| CarelinkError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("CARELINK_BASE_URL") {
            self.backend.base_url = base_url;
        }
        if let Ok(ws_url) = std::env::var("CARELINK_WS_URL") {
            self.backend.ws_url = ws_url;
        }
        if let Ok(cookie) = std::env::var("CARELINK_AUTH_COOKIE") {
            self.backend.auth_cookie = Some(cookie);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.base_url {
            self.backend.base_url = base_url.clone();
        }
        if let Some(ws_url) = &cli.ws_url {
            self.backend.ws_url = ws_url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`CarelinkError::Config`] for unusable endpoint URLs, a zero
    /// timeout, or an empty default identity.
    pub fn validate(&self) -> Result<()> {
        let base = self.backend.base_url()?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(CarelinkError::Config(format!(
                "base_url must be http or https, got {}",
                base.scheme()
            ))
            .into());
        }

        let ws = self.backend.ws_url()?;
        if !matches!(ws.scheme(), "ws" | "wss") {
            return Err(CarelinkError::Config(format!(
                "ws_url must be ws or wss, got {}",
                ws.scheme()
            ))
            .into());
        }

        if self.backend.timeout_seconds == 0 {
            return Err(
                CarelinkError::Config("timeout_seconds must be greater than 0".to_string()).into(),
            );
        }

        if self.session.default_identity.trim().is_empty() {
            return Err(
                CarelinkError::Config("default_identity cannot be empty".to_string()).into(),
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend.base_url, "http://localhost:5000");
        assert_eq!(config.session.default_identity, "Guest");
    }

    #[test]
    fn test_parse_partial_yaml_uses_defaults() {
        let yaml = "backend:\n  base_url: https://assistant.example.org\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.backend.base_url, "https://assistant.example.org");
        assert_eq!(config.backend.timeout_seconds, 30);
        assert_eq!(config.session.default_identity, "Guest");
    }

    #[test]
    fn test_validate_rejects_bad_base_url_scheme() {
        let mut config = Config::default();
        config.backend.base_url = "ftp://example.org".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_ws_scheme() {
        let mut config = Config::default();
        config.backend.ws_url = "http://example.org/ws".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.backend.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_identity() {
        let mut config = Config::default();
        config.session.default_identity = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_conversion() {
        let config = Config::default();
        assert_eq!(config.backend.timeout(), Duration::from_secs(30));
    }
}
