//! Message types for LLM communication
//!
//! This module defines the message types exchanged with a chat-completion
//! model that supports function calling. A conversation is an ordered list
//! of these messages; function results travel back to the model as
//! `function`-role messages named after the function that produced them.

use serde::{Deserialize, Serialize};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message (instructions for the model)
    System,
    /// User message
    User,
    /// Assistant message
    Assistant,
    /// Result of a function the assistant asked for
    Function,
}

/// A function-call intent emitted by the assistant
///
/// `arguments` is kept exactly as the model produced it: a JSON document
/// encoded as a string. It is untrusted and may not even be valid JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the function the model wants to invoke
    pub name: String,
    /// JSON-encoded argument object
    pub arguments: String,
}

impl FunctionCall {
    /// Create a new function call
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Message content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Function name (required for `function` messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Function-call intent (assistant messages only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
}

impl Message {
    fn text_message(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(text.into()),
            name: None,
            function_call: None,
        }
    }

    /// Create a user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self::text_message(Role::User, text)
    }

    /// Create an assistant message with text
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text_message(Role::Assistant, text)
    }

    /// Create a function-result message
    pub fn function(name: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            role: Role::Function,
            content: Some(result.into()),
            name: Some(name.into()),
            function_call: None,
        }
    }

    /// Create an assistant message that only carries a function-call intent
    pub fn assistant_function_call(call: FunctionCall) -> Self {
        Self {
            role: Role::Assistant,
            content: None,
            name: None,
            function_call: Some(call),
        }
    }

    /// Text content of the message, if any
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref()
    }

    /// Function-call intent of the message, if any
    pub fn function_call(&self) -> Option<&FunctionCall> {
        self.function_call.as_ref()
    }

    /// Check if this message asks for a function call
    pub fn has_function_call(&self) -> bool {
        self.function_call.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), Some("Hello"));
        assert!(!msg.has_function_call());
    }

    #[test]
    fn test_function_message() {
        let msg = Message::function("get_stock_price", "189.5");
        assert_eq!(msg.role, Role::Function);
        assert_eq!(msg.name.as_deref(), Some("get_stock_price"));
        assert_eq!(msg.text(), Some("189.5"));
    }

    #[test]
    fn test_assistant_function_call() {
        let msg = Message::assistant_function_call(FunctionCall::new(
            "calculate_RSI",
            r#"{"ticker":"MSFT"}"#,
        ));
        assert!(msg.has_function_call());
        assert_eq!(msg.text(), None);
        assert_eq!(msg.function_call().map(|c| c.name.as_str()), Some("calculate_RSI"));
    }

    #[test]
    fn test_message_serialization_skips_empty_fields() {
        let msg = Message::user("Test");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "Test"}));

        let msg = Message::function("calculate_MACD", "1, 2, -1");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "function");
        assert_eq!(json["name"], "calculate_MACD");
    }
}
