//! Error types for the chat core
//!
//! Every variant aborts the current turn. None of them is ever turned into an
//! assistant message; the caller decides how to show the failure.

use stockchat_llm::LLMError;
use thiserror::Error;

/// Errors raised while answering a user message
#[derive(Debug, Error)]
pub enum ChatError {
    /// The price series could not be obtained
    #[error("Data not available for {ticker}: {reason}")]
    DataUnavailable { ticker: String, reason: String },

    /// The requested window or period needs more observations than exist
    #[error("Insufficient data: {required} observations required, {available} available")]
    InsufficientData { required: usize, available: usize },

    /// The model named a function outside the catalog
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// A required parameter is absent from the argument payload
    #[error("Missing argument '{argument}' for {function}")]
    MissingArgument { function: String, argument: String },

    /// A parameter is present but has the wrong shape
    #[error("Invalid argument '{argument}' for {function}: {reason}")]
    InvalidArgument {
        function: String,
        argument: String,
        reason: String,
    },

    /// The model call errored or returned something unusable
    #[error("Model call failed: {0}")]
    ModelCallFailed(String),

    /// Chart rendering or writing the artifact failed
    #[error("Chart error: {0}")]
    Chart(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Bot command could not be parsed
    #[error("Command error: {0}")]
    CommandError(String),
}

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;

impl ChatError {
    /// Shorthand for a [`ChatError::DataUnavailable`]
    pub fn data_unavailable(ticker: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataUnavailable {
            ticker: ticker.into(),
            reason: reason.into(),
        }
    }
}

impl From<LLMError> for ChatError {
    fn from(err: LLMError) -> Self {
        ChatError::ModelCallFailed(err.to_string())
    }
}

impl From<stockchat_utils::ConfigError> for ChatError {
    fn from(err: stockchat_utils::ConfigError) -> Self {
        ChatError::ConfigError(err.to_string())
    }
}
