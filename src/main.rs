//! Carelink - conversational healthcare assistant client
//!
#![doc = "Carelink - conversational healthcare assistant client"]
#![doc = "Main entry point for the Carelink session CLI."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use carelink::cli::{Cli, Commands};
use carelink::commands;
use carelink::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let cli = Cli::parse_args();

    // If the user supplied a cache directory on the CLI, mirror it into
    // CARELINK_CACHE_DIR so the cache initializer can pick it up. This
    // keeps callers unchanged while allowing `SessionCache::open()` to
    // honor an override.
    if let Some(cache_dir) = &cli.cache_dir {
        std::env::set_var("CARELINK_CACHE_DIR", cache_dir);
        tracing::info!("Using cache directory override from CLI: {}", cache_dir);
    }

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { identity } => {
            tracing::info!("Starting interactive chat session");
            if let Some(name) = &identity {
                tracing::debug!("Using identity override: {}", name);
            }
            commands::chat::run_chat(config, identity).await?;
            Ok(())
        }
        Commands::History { json } => {
            tracing::info!("Showing cached conversation");
            commands::history::show_cached(json)?;
            Ok(())
        }
        Commands::Upload { file, description } => {
            tracing::info!("Uploading document: {}", file.display());
            commands::upload::run_upload(config, &file, &description).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("carelink=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
