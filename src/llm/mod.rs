//! Language model completion
//!
//! The relay only needs one operation from a language model: turn an ordered
//! list of messages into a reply string.

mod gemini;

pub use gemini::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, GeminiClient};

use async_trait::async_trait;
use serde::Serialize;

use crate::Result;

/// Speaker of a message sent to the completion API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
}

/// A single message in a completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub text: String,
}

/// Provider-neutral completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Ordered conversation; the last entry is the message to answer
    pub messages: Vec<ChatMessage>,
    /// Output token cap
    pub max_output_tokens: u32,
    /// Sampling temperature, provider default when `None`
    pub temperature: Option<f32>,
}

/// A hosted language model
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce a reply for the conversation
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response has no text
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Model identifier for logging
    fn model_id(&self) -> &str;
}
