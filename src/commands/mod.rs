/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `chat`    -- Interactive chat session over the duplex channel
- `history` -- Inspect the cached conversation from the last session
- `upload`  -- One-shot document upload

These handlers are intentionally small and use the library components:
the backend client, the duplex channel, and the session engine.
*/

use std::sync::Arc;

use crate::api::{BackendApi, HttpBackend};
use crate::cache::SessionCache;
use crate::channel::{DuplexConnector, WsConnector};
use crate::config::Config;
use crate::error::Result;
use crate::session::{SessionContext, SessionEngine};

// Special commands parser for the interactive session
pub mod special_commands;

/// Builds the HTTP backend from configuration
fn build_backend(config: &Config) -> Result<Arc<dyn BackendApi>> {
    Ok(Arc::new(HttpBackend::new(
        config.backend.base_url()?,
        config.backend.auth_cookie.clone(),
        config.backend.timeout(),
    )))
}

// Chat command handler
pub mod chat {
    //! Interactive chat session handler.
    //!
    //! Builds the backend client and WebSocket connector, creates a
    //! `SessionEngine`, and runs a readline loop that routes user input
    //! through the engine while channel events are drained concurrently.

    use super::*;
    use crate::channel::ChannelEvent;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::session::timeline::{Message, Role};
    use colored::Colorize;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::path::Path;
    use tokio::sync::mpsc;

    /// Start the interactive chat session
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `identity` - Optional override for the fallback identity
    pub async fn run_chat(config: Config, identity: Option<String>) -> Result<()> {
        tracing::info!("Starting interactive chat session");

        let backend = build_backend(&config)?;
        let connector: Arc<dyn DuplexConnector> =
            Arc::new(WsConnector::new(config.backend.ws_url()?));
        let cache = SessionCache::open()?;
        let fallback = identity.unwrap_or_else(|| config.session.default_identity.clone());

        let mut engine = SessionEngine::new(
            SessionContext::new(fallback),
            backend,
            connector,
            cache,
        );
        engine.start().await;

        println!(
            "Connected as {}. Type /help for commands.\n",
            engine.identity().bold()
        );
        let mut rendered = 0;
        render_new_turns(&engine, &mut rendered);

        // Readline runs on its own thread; lines arrive over a channel so
        // the loop can also react to channel events.
        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
        std::thread::spawn(move || {
            let mut rl = match DefaultEditor::new() {
                Ok(rl) => rl,
                Err(e) => {
                    eprintln!("Failed to initialize input: {}", e);
                    return;
                }
            };
            loop {
                match rl.readline("you> ") {
                    Ok(line) => {
                        let _ = rl.add_history_entry(line.as_str());
                        if line_tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                    Err(e) => {
                        eprintln!("Input error: {}", e);
                        break;
                    }
                }
            }
        });

        loop {
            tokio::select! {
                maybe_line = line_rx.recv() => {
                    let Some(line) = maybe_line else { break };
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    match parse_special_command(trimmed) {
                        SpecialCommand::Upload { path, description } => {
                            engine.upload_document(Path::new(&path), &description).await;
                        }
                        SpecialCommand::Status => {
                            print_status(&engine);
                            continue;
                        }
                        SpecialCommand::Help => {
                            print_help();
                            continue;
                        }
                        SpecialCommand::SignOut => {
                            engine.sign_out();
                            rendered = 0;
                            println!("Signed out; the cached conversation was cleared.");
                            continue;
                        }
                        SpecialCommand::Exit => break,
                        SpecialCommand::Unknown(message) => {
                            println!("{}", message.yellow());
                            continue;
                        }
                        SpecialCommand::None => {
                            engine.send_user_message(trimmed).await;
                        }
                    }
                    render_new_turns(&engine, &mut rendered);
                }
                event = engine.recv_event() => {
                    match event {
                        Some(ChannelEvent::Opened) => {
                            println!("{}", "(connected)".dimmed());
                        }
                        Some(ChannelEvent::Message(_)) => {
                            render_reply(&engine, &mut rendered);
                        }
                        Some(ChannelEvent::Closed { .. }) => {
                            render_new_turns(&engine, &mut rendered);
                            println!("{}", "(disconnected)".dimmed());
                        }
                        None => {}
                    }
                }
            }
        }

        println!("Goodbye.");
        Ok(())
    }

    /// Prints timeline entries past the watermark, skipping unresolved
    /// placeholders (they resolve in place and print via the event path).
    fn render_new_turns(engine: &SessionEngine, rendered: &mut usize) {
        let messages = engine.timeline().messages();
        for message in &messages[*rendered..] {
            if !message.placeholder {
                print_turn(message);
            }
        }
        *rendered = messages.len();
    }

    /// Prints an inbound assistant reply, covering an in-place resolution
    /// behind the watermark as well as an appended unsolicited turn.
    fn render_reply(engine: &SessionEngine, rendered: &mut usize) {
        let messages = engine.timeline().messages();
        if messages.len() == *rendered {
            // In-place placeholder resolution: the newest resolved
            // assistant turn is the one that just changed.
            if let Some(message) = messages
                .iter()
                .rev()
                .find(|m| m.role == Role::Assistant && !m.placeholder)
            {
                print_turn(message);
            }
            return;
        }
        render_new_turns(engine, rendered);
    }

    fn print_turn(message: &Message) {
        match message.role {
            Role::User => println!("{} {}", "you:".cyan().bold(), message.text),
            Role::Assistant => println!("{} {}", "assistant:".green().bold(), message.text),
        }
    }

    fn print_status(engine: &SessionEngine) {
        let availability = if engine.is_available() {
            "connected".green().to_string()
        } else {
            "disconnected".red().to_string()
        };
        println!("Identity:   {}", engine.identity());
        println!(
            "Channel:    {} ({})",
            availability,
            engine.connection_state()
        );
        println!("Messages:   {}", engine.timeline().len());
        println!(
            "Pending:    {}",
            if engine.is_awaiting_confirmation() {
                "analysis offer awaiting your reply"
            } else {
                "none"
            }
        );
    }
}

// History command handler
pub mod history {
    //! Cached-history inspection.
    //!
    //! Prints the conversation mirrored by the last session. The cache is a
    //! resilience fallback; the authoritative copy lives on the server and
    //! is re-fetched on every chat start.

    use super::*;
    use crate::session::timeline::Role;
    use colored::Colorize;

    /// Print the cached conversation
    pub fn show_cached(json: bool) -> Result<()> {
        let cache = SessionCache::open()?;
        let identity = cache.cached_identity()?;
        let messages = cache.cached_messages()?;

        if json {
            println!("{}", serde_json::to_string_pretty(&messages)?);
            return Ok(());
        }

        match identity {
            Some(identity) => println!("Cached conversation for {}:\n", identity.bold()),
            None => {
                println!("No cached conversation.");
                return Ok(());
            }
        }

        for message in &messages {
            let tag = match message.role {
                Role::User => "you:".cyan().bold(),
                Role::Assistant => "assistant:".green().bold(),
            };
            println!("{} {}", tag, message.text);
        }
        println!("\n{} messages.", messages.len());
        Ok(())
    }
}

// Upload command handler
pub mod upload {
    //! One-shot document upload without a chat session.

    use super::*;
    use crate::documents;
    use std::path::Path;

    /// Validate and upload a single document, printing the outcome
    pub async fn run_upload(config: Config, file: &Path, description: &str) -> Result<()> {
        let backend = build_backend(&config)?;

        let submission = documents::prepare(file, description).await?;
        let file_name = submission.file_name.clone();
        let response = backend
            .upload_document(&file_name, submission.bytes, &submission.description)
            .await?;

        println!("Uploaded {} as {}.", file_name, response.filename);
        if documents::is_lab_report(&file_name) {
            println!("Start a chat session to have this lab report analyzed.");
        }
        Ok(())
    }
}
