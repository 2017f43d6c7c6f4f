//! Parsing of committed input lines.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/connect <ip> <port>`
    Connect { host: String, port: u16 },
    /// `/pm <name> <message...>`
    PrivateMessage { to: String, message: String },
    /// `/shell <name> <command...>`
    Shell { target: String, command: String },
    /// Anything that is not a slash command.
    Say(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid port: {0}")]
    InvalidPort(String),

    #[error("unknown command: {0}")]
    Unknown(String),
}

const CONNECT_USAGE: &str = "/connect <ip> <port>";
const PM_USAGE: &str = "/pm <name> <message...>";
const SHELL_USAGE: &str = "/shell <name> <command...>";

/// Split off the first whitespace-delimited word.
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], text[end..].trim_start()),
        None => (text, ""),
    }
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        if !line.starts_with('/') {
            return Ok(Command::Say(line.to_string()));
        }

        let (word, rest) = split_word(line);
        match word {
            "/connect" => {
                let (host, rest) = split_word(rest);
                let (port, extra) = split_word(rest);
                if host.is_empty() || port.is_empty() || !extra.is_empty() {
                    return Err(CommandError::Usage(CONNECT_USAGE));
                }
                let port = port
                    .parse()
                    .map_err(|_| CommandError::InvalidPort(port.to_string()))?;
                Ok(Command::Connect {
                    host: host.to_string(),
                    port,
                })
            }
            "/pm" => {
                let (to, message) = split_word(rest);
                if to.is_empty() || message.is_empty() {
                    return Err(CommandError::Usage(PM_USAGE));
                }
                Ok(Command::PrivateMessage {
                    to: to.to_string(),
                    message: message.to_string(),
                })
            }
            "/shell" => {
                let (target, command) = split_word(rest);
                if target.is_empty() || command.is_empty() {
                    return Err(CommandError::Usage(SHELL_USAGE));
                }
                Ok(Command::Shell {
                    target: target.to_string(),
                    command: command.to_string(),
                })
            }
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }

    /// Text sent to the peer for this command, if it goes over the wire.
    pub fn wire_text(&self) -> Option<String> {
        match self {
            Command::Connect { .. } => None,
            Command::PrivateMessage { to, message } => Some(format!("/pm {} {}", to, message)),
            Command::Shell { target, command } => Some(format!("/shell {} {}", target, command)),
            Command::Say(text) => Some(text.clone()),
        }
    }
}
