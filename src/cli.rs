//! Command-line interface definition for Carelink
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for the interactive chat session, cached-history
//! inspection, and one-shot document upload.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Carelink - conversational healthcare assistant client
///
/// Chat with the assistant over a persistent session, upload medical
/// documents, and review your conversation history.
#[derive(Parser, Debug, Clone)]
#[command(name = "carelink")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the backend HTTP origin
    #[arg(long, env = "CARELINK_BASE_URL")]
    pub base_url: Option<String>,

    /// Override the duplex channel endpoint
    #[arg(long, env = "CARELINK_WS_URL")]
    pub ws_url: Option<String>,

    /// Override the session cache directory
    #[arg(long)]
    pub cache_dir: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Carelink
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session with the assistant
    Chat {
        /// Identity to connect as when the server does not answer
        #[arg(short, long)]
        identity: Option<String>,
    },

    /// Show the cached conversation from the last session
    History {
        /// Print the raw cached messages as JSON
        #[arg(long)]
        json: bool,
    },

    /// Upload one document without starting a chat session
    Upload {
        /// Path to the file to upload
        file: PathBuf,

        /// Free-text description stored with the document
        #[arg(short, long, default_value = "")]
        description: String,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_chat_with_identity() {
        let cli = Cli::try_parse_from(["carelink", "chat", "--identity", "Mario Rossi"]).unwrap();
        match cli.command {
            Commands::Chat { identity } => assert_eq!(identity.as_deref(), Some("Mario Rossi")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_upload_with_description() {
        let cli = Cli::try_parse_from([
            "carelink",
            "upload",
            "report.pdf",
            "--description",
            "blood work",
        ])
        .unwrap();
        match cli.command {
            Commands::Upload { file, description } => {
                assert_eq!(file, PathBuf::from("report.pdf"));
                assert_eq!(description, "blood work");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_requires_a_subcommand() {
        assert!(Cli::try_parse_from(["carelink"]).is_err());
    }
}
