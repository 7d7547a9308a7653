//! LlmClient trait definition

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::LlmError;

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A single text-completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System instructions for the call
    pub system_prompt: String,
    /// Conversation turns, oldest first
    pub messages: Vec<Message>,
    /// Output token budget
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

/// The model's reply
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
}

/// Stateless LLM client - each call is independent
///
/// The engine never relies on provider-side conversation state; whatever
/// history a call needs is passed explicitly in the request.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
