//! Coaching relay: one completion, then one synthesis
//!
//! ```text
//! SpeakRequest ──► prompt ──► ChatModel ──► reply ──► SpeechSynthesizer ──► SpeakResponse
//!                                              │                │
//!                                              │         failure: no audio
//!                                        failure: Error
//! ```

use std::sync::Arc;
use std::time::Instant;

use base64::Engine;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::conversation::{SpeakRequest, SpeakResponse};
use crate::llm::{ChatModel, GeminiClient};
use crate::persona::Persona;
use crate::prompt::build_completion_request;
use crate::voice::{SpeechSynthesizer, TextToSpeech};
use crate::{Error, Result};

/// Mediates between the client and the hosted AI services
#[derive(Clone)]
pub struct CoachRelay {
    persona: Arc<Persona>,
    model: Arc<dyn ChatModel>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

impl CoachRelay {
    /// Create a relay; without a synthesizer every reply is text-only
    #[must_use]
    pub fn new(
        persona: Persona,
        model: Arc<dyn ChatModel>,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    ) -> Self {
        Self {
            persona: Arc::new(persona),
            model,
            synthesizer,
        }
    }

    /// Build the relay described by `config`
    ///
    /// A missing synthesis key is not an error: the relay runs text-only.
    ///
    /// # Errors
    ///
    /// Returns error if the Gemini key is missing, the persona cannot be
    /// loaded, or an HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Self> {
        let persona = Persona::load(config.persona_file.as_deref())?;

        let api_key = config.api_keys.gemini.clone().ok_or_else(|| {
            Error::Config("GEMINI_API_KEY is required for completions".to_string())
        })?;
        let model = GeminiClient::with_options(
            api_key,
            config.llm.model.clone(),
            config.llm.base_url.clone(),
            config.server.upstream_timeout,
        )?;

        let synthesizer = TextToSpeech::from_config(config)?
            .map(|tts| Arc::new(tts) as Arc<dyn SpeechSynthesizer>);
        if synthesizer.is_none() {
            tracing::warn!(
                provider = config.voice.provider.as_str(),
                "no TTS API key configured, replies will be text-only"
            );
        }

        tracing::info!(
            persona = %persona.id,
            model = %config.llm.model,
            tts = synthesizer.as_ref().map_or("none", |s| s.name()),
            "coaching relay configured"
        );

        Ok(Self::new(persona, Arc::new(model), synthesizer))
    }

    /// Active persona
    #[must_use]
    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Completion model identifier
    #[must_use]
    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Name of the synthesis provider, if one is configured
    #[must_use]
    pub fn synthesizer_name(&self) -> Option<&'static str> {
        self.synthesizer.as_ref().map(|s| s.name())
    }

    /// Run one coaching turn
    ///
    /// Synthesis runs only after the reply is complete. A synthesis failure
    /// is logged and the response carries no audio.
    ///
    /// # Errors
    ///
    /// Returns error if the completion call fails
    pub async fn speak(&self, request: &SpeakRequest) -> Result<SpeakResponse> {
        let span = tracing::info_span!(
            "speak",
            request_id = %Uuid::new_v4(),
            text_len = request.text.len(),
            history_len = request.history.len(),
        );

        self.speak_inner(request).instrument(span).await
    }

    async fn speak_inner(&self, request: &SpeakRequest) -> Result<SpeakResponse> {
        let completion = build_completion_request(&self.persona, request);
        tracing::debug!(
            messages = completion.messages.len(),
            max_output_tokens = completion.max_output_tokens,
            model = self.model.model_id(),
            "requesting completion"
        );

        let started = Instant::now();
        let reply = self.model.complete(&completion).await.inspect_err(|e| {
            tracing::error!(error = %e, elapsed_ms = elapsed_ms(started), "completion failed");
        })?;
        tracing::info!(
            reply_len = reply.len(),
            elapsed_ms = elapsed_ms(started),
            "completion received"
        );

        let audio_base64 = self.synthesize(&reply).await;

        Ok(SpeakResponse {
            reply,
            audio_base64,
        })
    }

    async fn synthesize(&self, reply: &str) -> Option<String> {
        let synthesizer = self.synthesizer.as_ref()?;
        if reply.trim().is_empty() {
            tracing::debug!("empty reply, skipping speech synthesis");
            return None;
        }

        let started = Instant::now();
        match synthesizer.synthesize(reply).await {
            Ok(audio) => {
                let encoded = base64::engine::general_purpose::STANDARD.encode(&audio);
                tracing::info!(
                    provider = synthesizer.name(),
                    audio_bytes = audio.len(),
                    elapsed_ms = elapsed_ms(started),
                    "speech synthesized"
                );
                Some(encoded)
            }
            Err(e) => {
                tracing::warn!(
                    provider = synthesizer.name(),
                    error = %e,
                    elapsed_ms = elapsed_ms(started),
                    "speech synthesis failed, replying without audio"
                );
                None
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::conversation::Turn;
    use crate::config::file::CoachConfigFile;
    use crate::llm::CompletionRequest;

    struct EchoModel {
        seen: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(format!("{} messages", request.messages.len()))
        }

        fn model_id(&self) -> &str {
            "echo"
        }
    }

    struct FailingModel;

    #[async_trait]
    impl ChatModel for FailingModel {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            Err(Error::Llm("quota exceeded".to_string()))
        }

        fn model_id(&self) -> &str {
            "failing"
        }
    }

    struct FixedAudio(Vec<u8>);

    #[async_trait]
    impl SpeechSynthesizer for FixedAudio {
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct SilentModel;

    #[async_trait]
    impl ChatModel for SilentModel {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            Ok(String::new())
        }

        fn model_id(&self) -> &str {
            "silent"
        }
    }

    struct BrokenSpeech;

    #[async_trait]
    impl SpeechSynthesizer for BrokenSpeech {
        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
            Err(Error::Tts("401 unauthorized".to_string()))
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn echo() -> Arc<EchoModel> {
        Arc::new(EchoModel {
            seen: Mutex::new(Vec::new()),
        })
    }

    fn request(text: &str, history: Vec<Turn>) -> SpeakRequest {
        SpeakRequest {
            text: text.to_string(),
            history,
        }
    }

    #[tokio::test]
    async fn reply_and_audio_are_combined() {
        let relay = CoachRelay::new(
            Persona::embedded().unwrap(),
            echo(),
            Some(Arc::new(FixedAudio(b"ID3".to_vec()))),
        );

        let response = relay.speak(&request("hello", vec![])).await.unwrap();
        assert_eq!(response.reply, "1 messages");
        assert_eq!(response.audio_base64.as_deref(), Some("SUQz"));
    }

    #[tokio::test]
    async fn synthesis_failure_degrades_to_text() {
        let relay = CoachRelay::new(
            Persona::embedded().unwrap(),
            echo(),
            Some(Arc::new(BrokenSpeech)),
        );

        let response = relay.speak(&request("hello", vec![])).await.unwrap();
        assert_eq!(response.reply, "1 messages");
        assert!(response.audio_base64.is_none());
    }

    #[tokio::test]
    async fn no_synthesizer_means_no_audio() {
        let relay = CoachRelay::new(Persona::embedded().unwrap(), echo(), None);

        let response = relay.speak(&request("hello", vec![])).await.unwrap();
        assert!(response.audio_base64.is_none());
        assert!(relay.synthesizer_name().is_none());
    }

    #[tokio::test]
    async fn empty_reply_is_returned_without_audio() {
        let relay = CoachRelay::new(
            Persona::embedded().unwrap(),
            Arc::new(SilentModel),
            Some(Arc::new(FixedAudio(b"ID3".to_vec()))),
        );

        let response = relay.speak(&request("hello", vec![])).await.unwrap();
        assert_eq!(response.reply, "");
        assert!(response.audio_base64.is_none());
    }

    #[tokio::test]
    async fn completion_failure_is_propagated() {
        let relay = CoachRelay::new(
            Persona::embedded().unwrap(),
            Arc::new(FailingModel),
            Some(Arc::new(FixedAudio(vec![1]))),
        );

        let result = relay.speak(&request("hello", vec![])).await;
        assert!(matches!(result, Err(Error::Llm(_))));
    }

    #[tokio::test]
    async fn history_reaches_the_model_without_its_last_entry() {
        let model = echo();
        let relay = CoachRelay::new(Persona::embedded().unwrap(), model.clone(), None);

        let history = vec![
            Turn::user("I go to market yesterday"),
            Turn::assistant("Oh cool! What did you buy?"),
            Turn::user("I buyed apples"),
        ];
        relay
            .speak(&request("I buyed apples", history))
            .await
            .unwrap();

        let seen = model.seen.lock().unwrap();
        let messages = &seen[0].messages;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].text, "I go to market yesterday");
        assert_eq!(messages[1].text, "Oh cool! What did you buy?");
        assert!(messages[2].text.contains("User said: \"I buyed apples\""));
        assert_eq!(seen[0].max_output_tokens, 200);
    }

    #[test]
    fn from_config_requires_gemini_key() {
        let config = Config::from_sources(CoachConfigFile::default(), |_| None).unwrap();
        assert!(matches!(CoachRelay::from_config(&config), Err(Error::Config(_))));
    }

    #[test]
    fn from_config_without_tts_key_is_text_only() {
        let config = Config::from_sources(CoachConfigFile::default(), |name| {
            (name == "GEMINI_API_KEY").then(|| "test-key".to_string())
        })
        .unwrap();

        let relay = CoachRelay::from_config(&config).unwrap();
        assert_eq!(relay.model_id(), "gemini-2.5-flash");
        assert_eq!(relay.persona().id, "coach");
        assert!(relay.synthesizer_name().is_none());
    }

    #[test]
    fn from_config_picks_configured_tts_provider() {
        let config = Config::from_sources(CoachConfigFile::default(), |name| match name {
            "GEMINI_API_KEY" => Some("g".to_string()),
            "OPENAI_API_KEY" => Some("o".to_string()),
            _ => None,
        })
        .unwrap();

        let relay = CoachRelay::from_config(&config).unwrap();
        assert_eq!(relay.synthesizer_name(), Some("openai"));
    }
}
