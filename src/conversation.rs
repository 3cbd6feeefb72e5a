//! Conversation turns and the relay's wire types
//!
//! The browser owns the conversation. It resends every turn on each request,
//! so nothing here is persisted.

use serde::{Deserialize, Serialize};

/// Who spoke a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// The coach. `ai` is what the web client labels replies with,
    /// `model` is the completion API's name for the same speaker.
    #[serde(alias = "ai", alias = "model")]
    Assistant,
}

/// One exchange unit in the conversation history
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    /// Create a user turn
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create an assistant turn
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Body of `POST /api/speak`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpeakRequest {
    /// The finalized utterance
    pub text: String,

    /// Every turn so far, including the one that duplicates `text`
    #[serde(default)]
    pub history: Vec<Turn>,
}

impl SpeakRequest {
    /// Turns that happened before the current utterance
    ///
    /// The client appends the user's turn before sending, so the last
    /// history entry is dropped.
    #[must_use]
    pub fn prior_turns(&self) -> &[Turn] {
        self.history
            .split_last()
            .map_or(&[], |(_, prior)| prior)
    }
}

/// Body returned by `POST /api/speak`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakResponse {
    /// The coach's reply text
    pub reply: String,

    /// MP3 audio of the reply, base64 encoded; absent when synthesis failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
}
