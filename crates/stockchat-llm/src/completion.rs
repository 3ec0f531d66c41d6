//! Completion request and response types

use crate::{FunctionDefinition, Message};
use serde::{Deserialize, Serialize};

/// Request for LLM completion with full conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier (provider-specific)
    pub model: String,

    /// Conversation history
    pub messages: Vec<Message>,

    /// Optional system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Maximum tokens to generate
    pub max_tokens: usize,

    /// Sampling temperature (0.0-2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Functions the model may call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<FunctionDefinition>>,

    /// Whether the model may, must, or must not call a function
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCallPolicy>,
}

/// Function-call policy sent alongside the function catalog
///
/// On the wire this is `"auto"`, `"none"` or `{"name": "<function>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WirePolicy", try_from = "WirePolicy")]
pub enum FunctionCallPolicy {
    /// The model decides whether to call a function
    Auto,
    /// The model must answer directly
    None,
    /// The model must call the named function
    Forced(String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum WirePolicy {
    Mode(String),
    Named { name: String },
}

impl From<FunctionCallPolicy> for WirePolicy {
    fn from(policy: FunctionCallPolicy) -> Self {
        match policy {
            FunctionCallPolicy::Auto => WirePolicy::Mode("auto".to_string()),
            FunctionCallPolicy::None => WirePolicy::Mode("none".to_string()),
            FunctionCallPolicy::Forced(name) => WirePolicy::Named { name },
        }
    }
}

impl TryFrom<WirePolicy> for FunctionCallPolicy {
    type Error = String;

    fn try_from(wire: WirePolicy) -> Result<Self, Self::Error> {
        match wire {
            WirePolicy::Mode(mode) => match mode.as_str() {
                "auto" => Ok(FunctionCallPolicy::Auto),
                "none" => Ok(FunctionCallPolicy::None),
                other => Err(format!("unknown function_call mode: {other}")),
            },
            WirePolicy::Named { name } => Ok(FunctionCallPolicy::Forced(name)),
        }
    }
}

/// Response from LLM completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated message from the assistant
    pub message: Message,

    /// Stop reason (completed, max_tokens, function_call, etc.)
    pub stop_reason: StopReason,

    /// Token usage statistics
    pub usage: TokenUsage,
}

/// Reason the LLM stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural completion (end of turn)
    EndTurn,

    /// Hit max tokens limit
    MaxTokens,

    /// Stop sequence encountered
    StopSequence,

    /// Function call requested
    FunctionCall,
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens
    pub input_tokens: usize,

    /// Number of output tokens
    pub output_tokens: usize,
}

impl TokenUsage {
    /// Total tokens used (input + output)
    pub fn total(&self) -> usize {
        self.input_tokens + self.output_tokens
    }
}

impl CompletionResponse {
    /// Build an end-of-turn response around a message, with zero usage
    pub fn from_message(message: Message) -> Self {
        let stop_reason = if message.has_function_call() {
            StopReason::FunctionCall
        } else {
            StopReason::EndTurn
        };
        Self {
            message,
            stop_reason,
            usage: TokenUsage::default(),
        }
    }
}

impl CompletionRequest {
    /// Create a builder for completion requests
    pub fn builder(model: impl Into<String>) -> CompletionRequestBuilder {
        CompletionRequestBuilder::new(model)
    }
}

/// Builder for CompletionRequest
pub struct CompletionRequestBuilder {
    model: String,
    messages: Vec<Message>,
    system: Option<String>,
    max_tokens: usize,
    temperature: Option<f32>,
    functions: Option<Vec<FunctionDefinition>>,
    function_call: Option<FunctionCallPolicy>,
}

impl CompletionRequestBuilder {
    /// Create a new builder
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            system: None,
            max_tokens: 1024,
            temperature: None,
            functions: None,
            function_call: None,
        }
    }

    /// Set the conversation messages
    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Add a single message
    pub fn add_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the maximum tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the callable functions together with the call policy
    pub fn functions(mut self, functions: Vec<FunctionDefinition>, policy: FunctionCallPolicy) -> Self {
        self.functions = Some(functions);
        self.function_call = Some(policy);
        self
    }

    /// Build the completion request
    pub fn build(self) -> CompletionRequest {
        CompletionRequest {
            model: self.model,
            messages: self.messages,
            system: self.system,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            functions: self.functions,
            function_call: self.function_call,
        }
    }
}
