//! Conversational front end over the orchestrator
//!
//! [`StockBot`] owns one [`ChatSession`] and turns raw input lines into either
//! slash commands or model turns. Rendering the replies is left to the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use stockchat::bot::{BotConfig, BotReply, StockBot};
//!
//! let mut bot = StockBot::new(orchestrator, BotConfig::default());
//! match bot.process_input("What's the price of AAPL?").await? {
//!     BotReply::Message(text) => println!("{text}"),
//!     BotReply::Chart(path) => println!("chart written to {}", path.display()),
//!     BotReply::Exit => {}
//! }
//! ```

pub mod commands;

use crate::error::Result;
use crate::orchestrator::{ChatOrchestrator, TurnOutcome};
use crate::session::{ChatRole, ChatSession};
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::info;

pub use commands::Command;

/// Configuration for the bot front end
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Welcome message
    pub welcome_message: String,
    /// Prompt prefix
    pub prompt: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            welcome_message: "Stock Analysis Chatbot Assistant - type /help for help".to_string(),
            prompt: ">>> ".to_string(),
        }
    }
}

impl BotConfig {
    /// Create a builder
    pub fn builder() -> BotConfigBuilder {
        BotConfigBuilder::default()
    }
}

/// Builder for BotConfig
#[derive(Debug, Default)]
pub struct BotConfigBuilder {
    welcome_message: Option<String>,
    prompt: Option<String>,
}

impl BotConfigBuilder {
    /// Set welcome message
    pub fn welcome_message(mut self, msg: impl Into<String>) -> Self {
        self.welcome_message = Some(msg.into());
        self
    }

    /// Set prompt
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Build the config
    pub fn build(self) -> BotConfig {
        let defaults = BotConfig::default();
        BotConfig {
            welcome_message: self.welcome_message.unwrap_or(defaults.welcome_message),
            prompt: self.prompt.unwrap_or(defaults.prompt),
        }
    }
}

/// What the front end should show after one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotReply {
    /// Text to print
    Message(String),
    /// A chart was written at this path
    Chart(PathBuf),
    /// The user asked to leave
    Exit,
}

/// Chat bot holding a single session
pub struct StockBot {
    orchestrator: ChatOrchestrator,
    session: ChatSession,
    config: BotConfig,
}

impl StockBot {
    pub fn new(orchestrator: ChatOrchestrator, config: BotConfig) -> Self {
        Self {
            orchestrator,
            session: ChatSession::new(),
            config,
        }
    }

    /// Get the welcome message
    pub fn welcome(&self) -> &str {
        &self.config.welcome_message
    }

    /// Get the prompt
    pub fn prompt(&self) -> &str {
        &self.config.prompt
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Process user input and return a reply
    pub async fn process_input(&mut self, input: &str) -> Result<BotReply> {
        let command = Command::parse(input)?;
        self.execute_command(command).await
    }

    /// Execute a parsed command
    pub async fn execute_command(&mut self, command: Command) -> Result<BotReply> {
        match command {
            Command::Help => Ok(BotReply::Message(Command::help_text().to_string())),
            Command::History => Ok(BotReply::Message(self.render_history())),
            Command::Reset => {
                info!(session_id = %self.session.id, "Resetting session");
                self.session = ChatSession::new();
                Ok(BotReply::Message("Conversation cleared.".to_string()))
            }
            Command::Exit => Ok(BotReply::Exit),
            Command::Query { text } => {
                match self
                    .orchestrator
                    .handle_user_message(&mut self.session, &text)
                    .await?
                {
                    TurnOutcome::Answer(answer) => Ok(BotReply::Message(answer)),
                    TurnOutcome::Chart(artifact) => Ok(BotReply::Chart(artifact.path)),
                }
            }
        }
    }

    fn render_history(&self) -> String {
        if self.session.is_empty() {
            return "No conversation yet.".to_string();
        }

        let mut out = String::new();
        for message in self.session.messages() {
            let _ = match (message.role, &message.function_name) {
                (ChatRole::User, _) => writeln!(out, "user: {}", message.content),
                (ChatRole::Function, Some(name)) => {
                    writeln!(out, "function {name}: {}", message.content)
                }
                (ChatRole::Function, None) => writeln!(out, "function: {}", message.content),
                (ChatRole::Assistant, _) if message.is_chart() => {
                    writeln!(out, "assistant: [chart] {}", message.content)
                }
                (ChatRole::Assistant, _) => writeln!(out, "assistant: {}", message.content),
            };
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockPriceSource;
    use crate::config::ChatConfig;
    use crate::error::ChatError;
    use async_trait::async_trait;
    use std::sync::Arc;
    use stockchat_llm::{CompletionRequest, CompletionResponse, LLMProvider, Message};

    struct EchoProvider;

    #[async_trait]
    impl LLMProvider for EchoProvider {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> stockchat_llm::Result<CompletionResponse> {
            let last = request
                .messages
                .last()
                .and_then(Message::text)
                .unwrap_or_default()
                .to_string();
            Ok(CompletionResponse::from_message(Message::assistant(format!(
                "You said: {last}"
            ))))
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    fn bot() -> StockBot {
        let mut source = MockPriceSource::new();
        source.expect_fetch_daily_closes().never();
        let orchestrator = ChatOrchestrator::new(
            Arc::new(EchoProvider),
            Arc::new(source),
            ChatConfig::default(),
        );
        StockBot::new(orchestrator, BotConfig::default())
    }

    #[tokio::test]
    async fn test_query_and_history() {
        let mut bot = bot();

        let reply = bot.process_input("hello there").await.unwrap();
        assert_eq!(reply, BotReply::Message("You said: hello there".to_string()));

        match bot.process_input("/history").await.unwrap() {
            BotReply::Message(text) => {
                assert!(text.contains("user: hello there"));
                assert!(text.contains("assistant: You said: hello there"));
            }
            other => panic!("Expected history text, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reset_and_exit() {
        let mut bot = bot();
        bot.process_input("hi").await.unwrap();
        assert_eq!(bot.session().len(), 2);

        bot.process_input("/reset").await.unwrap();
        assert!(bot.session().is_empty());
        assert_eq!(
            bot.process_input("/history").await.unwrap(),
            BotReply::Message("No conversation yet.".to_string())
        );

        assert_eq!(bot.process_input("/exit").await.unwrap(), BotReply::Exit);
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let mut bot = bot();
        let err = bot.process_input("/portfolio").await.unwrap_err();
        assert!(matches!(err, ChatError::CommandError(_)));
        assert!(bot.session().is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = BotConfig::builder().prompt("$ ").build();
        assert_eq!(config.prompt, "$ ");
        assert_eq!(config.welcome_message, BotConfig::default().welcome_message);
    }
}
