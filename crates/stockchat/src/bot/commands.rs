//! Slash-command parsing for the chat front end

use crate::error::{ChatError, Result};

/// Parsed user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show help
    Help,
    /// Print the conversation so far
    History,
    /// Start a fresh session
    Reset,
    /// Exit the bot
    Exit,
    /// Natural-language question for the model
    Query { text: String },
}

impl Command {
    /// Parse a command from user input
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        if input.is_empty() {
            return Err(ChatError::CommandError("Empty input".to_string()));
        }

        let Some(rest) = input.strip_prefix('/') else {
            return Ok(Command::Query {
                text: input.to_string(),
            });
        };

        let Some(cmd) = rest.split_whitespace().next() else {
            return Err(ChatError::CommandError("Empty command".to_string()));
        };

        match cmd.to_lowercase().as_str() {
            "help" | "h" | "?" => Ok(Command::Help),
            "history" | "hist" => Ok(Command::History),
            "reset" | "clear" | "cls" => Ok(Command::Reset),
            "exit" | "quit" | "q" => Ok(Command::Exit),
            other => Err(ChatError::CommandError(format!("Unknown command: /{other}"))),
        }
    }

    /// Help text for all commands
    pub fn help_text() -> &'static str {
        r#"
Stock Chat Commands
===================

  /help                  Show this help
  /history               Show the conversation so far
  /reset                 Forget the conversation and start over
  /exit                  Exit

Aliases:
  /h = /help   /clear = /reset   /q = /exit

Anything else is sent to the model, for example:
  - "What's the price of AAPL?"
  - "Calculate the 50 day SMA for MSFT"
  - "What is the RSI of NVDA?"
  - "Show me TSLA's chart"
"#
    }
}
