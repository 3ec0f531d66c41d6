//! Conversation log for one chat session

use crate::chart::ChartArtifact;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use stockchat_llm::Message;
use uuid::Uuid;

/// Who authored a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    Function,
}

/// One entry of the conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: ChatRole,
    pub content: String,
    /// Set on `function` messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    /// Set on assistant messages that stand for a rendered chart
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            function_name: None,
            artifact: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            function_name: None,
            artifact: None,
        }
    }

    /// Result of a function, named after it
    pub fn function(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Function,
            content: content.into(),
            function_name: Some(name.into()),
            artifact: None,
        }
    }

    /// Assistant message referencing a chart; its content is the artifact path
    pub fn chart(artifact: &ChartArtifact) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: artifact.path.display().to_string(),
            function_name: None,
            artifact: Some(artifact.path.clone()),
        }
    }

    pub fn is_chart(&self) -> bool {
        self.artifact.is_some()
    }

    /// Model-facing form of this message
    pub fn to_llm(&self) -> Message {
        match self.role {
            ChatRole::User => Message::user(self.content.clone()),
            ChatRole::Assistant => Message::assistant(self.content.clone()),
            ChatRole::Function => Message::function(
                self.function_name.clone().unwrap_or_default(),
                self.content.clone(),
            ),
        }
    }
}

/// Ordered, append-only message log owned by the caller
///
/// The orchestrator borrows it mutably for one turn at a time and appends a
/// turn's messages only once the turn has completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    messages: Vec<ConversationMessage>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// Empty session
    pub fn new() -> Self {
        Self::from_messages(Vec::new())
    }

    /// Session resuming an existing log
    pub fn from_messages(messages: Vec<ConversationMessage>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            messages,
            created_at: now,
            last_active: now,
        }
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }

    /// Model-facing view of the whole log
    pub fn to_llm_messages(&self) -> Vec<Message> {
        self.messages.iter().map(ConversationMessage::to_llm).collect()
    }

    /// Append a completed turn
    pub(crate) fn commit(&mut self, turn: Vec<ConversationMessage>) {
        self.messages.extend(turn);
        self.last_active = Utc::now();
    }
}
