//! LLM provider abstraction layer for stockchat
//!
//! This crate provides provider-agnostic abstractions for chat completions
//! with function calling. It includes:
//!
//! - Message types for the conversation log (user, assistant, function)
//! - Completion request/response types, including the function-call policy
//! - Function definitions handed to the model
//! - Provider trait for LLM implementations
//! - An OpenAI-compatible provider (behind the `openai` feature)

pub mod completion;
pub mod error;
pub mod functions;
pub mod messages;
pub mod provider;

// Re-export main types
pub use completion::{
    CompletionRequest, CompletionResponse, FunctionCallPolicy, StopReason, TokenUsage,
};
pub use error::{LLMError, Result};
pub use functions::FunctionDefinition;
pub use messages::{FunctionCall, Message, Role};
pub use provider::LLMProvider;

// Provider implementations (feature-gated)
#[cfg(feature = "openai")]
pub mod providers;
