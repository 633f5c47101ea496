//! Special commands parser for the interactive chat session
//!
//! Special commands let users drive the session without sending text to the
//! assistant: upload a document, check connection status, sign out, or
//! leave. Commands are prefixed with `/` and are case-insensitive.

/// Special commands that can be executed during an interactive session
///
/// These commands act on the local session state rather than being sent to
/// the assistant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Upload a document, optionally with a description
    ///
    /// Usage: `/upload <path> [description...]`
    Upload {
        /// Path to the file on disk
        path: String,
        /// Free-text description (may be empty)
        description: String,
    },

    /// Display connection state, identity, and pending-offer status
    Status,

    /// Display help information
    Help,

    /// Sign out: clears the identity and the cached conversation
    SignOut,

    /// Exit the interactive session
    Exit,

    /// Input started with `/` but matched no command
    Unknown(String),

    /// Not a special command
    ///
    /// The input should be sent to the assistant as a chat turn.
    None,
}

/// Parse a user input string into a special command
///
/// Checks if the input matches any special command pattern. Commands are
/// case-insensitive and may have multiple aliases; anything not starting
/// with `/` is a chat turn.
///
/// # Examples
///
/// ```
/// use carelink::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// assert_eq!(parse_special_command("/quit"), SpecialCommand::Exit);
/// assert_eq!(parse_special_command("hello"), SpecialCommand::None);
/// ```
pub fn parse_special_command(input: &str) -> SpecialCommand {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return SpecialCommand::None;
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or("").to_lowercase();
    let rest = parts.next().unwrap_or("").trim();

    match command.as_str() {
        "/upload" => {
            if rest.is_empty() {
                return SpecialCommand::Unknown(
                    "/upload requires a file path: /upload <path> [description]".to_string(),
                );
            }
            let mut rest_parts = rest.splitn(2, char::is_whitespace);
            let path = rest_parts.next().unwrap_or("").to_string();
            let description = rest_parts.next().unwrap_or("").trim().to_string();
            SpecialCommand::Upload { path, description }
        }
        "/status" => SpecialCommand::Status,
        "/help" | "/?" => SpecialCommand::Help,
        "/signout" | "/logout" => SpecialCommand::SignOut,
        "/quit" | "/exit" | "/q" => SpecialCommand::Exit,
        other => SpecialCommand::Unknown(format!(
            "Unknown command: {}. Type /help to see available commands.",
            other
        )),
    }
}

/// Print the help text for special commands
pub fn print_help() {
    println!("Available commands:");
    println!("  /upload <path> [description]  Upload a document (2 MiB limit)");
    println!("  /status                       Show connection and session status");
    println!("  /signout                      Sign out and clear the cached conversation");
    println!("  /help                         Show this help");
    println!("  /quit                         Leave the session");
    println!();
    println!("Anything else is sent to the assistant.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(parse_special_command("hello there"), SpecialCommand::None);
    }

    #[test]
    fn test_exit_aliases() {
        for input in ["/quit", "/exit", "/q", "/QUIT"] {
            assert_eq!(parse_special_command(input), SpecialCommand::Exit, "{}", input);
        }
    }

    #[test]
    fn test_upload_with_description() {
        let command = parse_special_command("/upload referto.pdf esami del sangue");
        assert_eq!(
            command,
            SpecialCommand::Upload {
                path: "referto.pdf".to_string(),
                description: "esami del sangue".to_string(),
            }
        );
    }

    #[test]
    fn test_upload_without_description() {
        let command = parse_special_command("/upload referto.pdf");
        assert_eq!(
            command,
            SpecialCommand::Upload {
                path: "referto.pdf".to_string(),
                description: String::new(),
            }
        );
    }

    #[test]
    fn test_upload_without_path_is_unknown() {
        assert!(matches!(
            parse_special_command("/upload"),
            SpecialCommand::Unknown(_)
        ));
    }

    #[test]
    fn test_unknown_command_reports_itself() {
        match parse_special_command("/frobnicate") {
            SpecialCommand::Unknown(msg) => assert!(msg.contains("/frobnicate")),
            other => panic!("expected Unknown, got {:?}", other),
        }
    }

    #[test]
    fn test_status_and_signout() {
        assert_eq!(parse_special_command("/status"), SpecialCommand::Status);
        assert_eq!(parse_special_command("/signout"), SpecialCommand::SignOut);
        assert_eq!(parse_special_command("/logout"), SpecialCommand::SignOut);
    }
}
