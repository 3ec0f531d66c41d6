//! Stock question answering over LLM function calling
//!
//! A language model picks one of six financial functions (latest price, SMA,
//! EMA, RSI, MACD, price chart) and the crate runs it against a year of daily
//! closes. It includes:
//!
//! - A price source abstraction with a Yahoo Finance implementation
//! - The indicator engine (price, SMA, EMA, RSI, MACD)
//! - An SVG chart renderer
//! - The function catalog exposed to the model
//! - Argument validation and dispatch
//! - The two-phase conversation orchestrator and its session log
//! - A slash-command bot front end
//!
//! # Example
//!
//! ```rust,ignore
//! use stockchat::{ChatConfig, ChatOrchestrator, ChatSession, YahooFinanceClient};
//! use stockchat_llm::providers::OpenAIProvider;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let provider = Arc::new(OpenAIProvider::from_env()?);
//!     let source = Arc::new(YahooFinanceClient::new());
//!     let orchestrator = ChatOrchestrator::new(provider, source, ChatConfig::from_env()?);
//!
//!     let mut session = ChatSession::new();
//!     let outcome = orchestrator
//!         .handle_user_message(&mut session, "What's the price of AAPL?")
//!         .await?;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod bot;
pub mod catalog;
pub mod chart;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod indicators;
pub mod orchestrator;
pub mod series;
pub mod session;

// Re-export main types for convenience
pub use api::{PriceSource, YahooFinanceClient};
pub use catalog::{Arity, CATALOG, FunctionCatalog, FunctionId, FunctionSpec, ParamSpec, ParamType};
pub use chart::{ChartArtifact, ChartRenderer};
pub use config::ChatConfig;
pub use dispatch::{DispatchOutcome, Dispatcher, Invocation, InvocationRequest};
pub use error::{ChatError, Result};
pub use indicators::{IndicatorResult, Macd};
pub use orchestrator::{ChatOrchestrator, TurnOutcome};
pub use series::{PricePoint, PriceSeries};
pub use session::{ChatRole, ChatSession, ConversationMessage};
