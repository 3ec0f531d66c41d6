//! Function definition types for LLM function calling

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Function definition for an LLM provider
///
/// This describes a function that the LLM can ask for, including its name,
/// description, and parameter schema in JSON Schema format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Function name (the key the model uses to ask for it)
    pub name: String,

    /// Description of what the function does
    pub description: String,

    /// JSON schema for the function's parameters
    pub parameters: Value,
}

impl FunctionDefinition {
    /// Create a new function definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Helper module to build JSON schemas for function parameters
pub mod schema {
    use serde_json::{Value, json};

    /// Create a JSON schema for an object with properties
    ///
    /// # Example
    ///
    /// ```
    /// use stockchat_llm::functions::schema;
    /// use serde_json::json;
    ///
    /// let schema = schema::object(
    ///     json!({
    ///         "ticker": schema::string("Ticker symbol"),
    ///         "window": schema::integer("Window size"),
    ///     }),
    ///     &["ticker", "window"],
    /// );
    /// assert_eq!(schema["required"][1], "window");
    /// ```
    pub fn object(properties: Value, required: &[&str]) -> Value {
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// String property schema
    pub fn string(description: &str) -> Value {
        json!({
            "type": "string",
            "description": description,
        })
    }

    /// Integer property schema
    pub fn integer(description: &str) -> Value {
        json!({
            "type": "integer",
            "description": description,
        })
    }
}
