//! Google Generative Language (Gemini) completion client

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{ChatMessage, ChatModel, CompletionRequest, MessageRole};
use crate::{Error, Result};

/// Public API endpoint
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used when none is configured
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: MessageRole,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenate the text parts of the first candidate
    fn into_text(self) -> Result<String> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(Error::Llm(format!("prompt blocked: {reason}")));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::Llm("response has no candidates".to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        // No parts (`MAX_TOKENS` spent on thinking) is an empty reply
        if text.trim().is_empty() {
            tracing::warn!(
                finish_reason = candidate.finish_reason.as_deref().unwrap_or("unknown"),
                "completion returned no text"
            );
        }

        Ok(text)
    }
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client for the public endpoint
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_options(api_key, model, DEFAULT_GEMINI_BASE_URL.to_string(), None)
    }

    /// Create a client with an explicit base URL and optional request timeout
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn with_options(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Gemini API key required for completions".to_string()));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_key: SecretString::from(api_key),
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

fn to_contents(messages: &[ChatMessage]) -> Vec<Content<'_>> {
    messages
        .iter()
        .map(|m| Content {
            role: m.role,
            parts: [Part { text: &m.text }],
        })
        .collect()
}

#[async_trait]
impl ChatModel for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = GenerateContentRequest {
            contents: to_contents(&request.messages),
            generation_config: GenerationConfig {
                max_output_tokens: request.max_output_tokens,
                temperature: request.temperature,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("Gemini error {status}: {body}")));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        parsed.into_text()
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
