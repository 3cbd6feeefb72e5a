//! Text-to-speech (TTS) processing

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::SpeechSynthesizer;
use crate::config::Config;
use crate::{Error, Result};

/// ElevenLabs "Rachel" voice
pub const DEFAULT_ELEVENLABS_VOICE: &str = "21m00Tcm4TlvDq8ikWAM";

/// ElevenLabs model used when none is configured
pub const DEFAULT_ELEVENLABS_MODEL: &str = "eleven_multilingual_v2";

const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io";
const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// TTS provider backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TtsProvider {
    OpenAI,
    ElevenLabs,
}

impl TtsProvider {
    /// Parse a provider name, case-insensitively
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "elevenlabs" | "eleven_labs" | "11labs" => Some(Self::ElevenLabs),
            "openai" => Some(Self::OpenAI),
            _ => None,
        }
    }

    /// Canonical name for logs and config output
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::ElevenLabs => "elevenlabs",
        }
    }
}

/// ElevenLabs voice tuning
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.45,
            similarity_boost: 0.75,
        }
    }
}

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    voice: String,
    speed: f32,
    model: String,
    settings: VoiceSettings,
    provider: TtsProvider,
    base_url: String,
}

impl TextToSpeech {
    /// Create a new TTS instance using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(api_key: String, voice: String, speed: f32) -> Result<Self> {
        Self::new_openai_with_model(api_key, voice, speed, "tts-1".to_string())
    }

    /// Create a new TTS instance using `OpenAI` with custom model
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai_with_model(
        api_key: String,
        voice: String,
        speed: f32,
        model: String,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: SecretString::from(api_key),
            voice,
            speed,
            model,
            settings: VoiceSettings::default(),
            provider: TtsProvider::OpenAI,
            base_url: OPENAI_BASE_URL.to_string(),
        })
    }

    /// Create a new TTS instance using ElevenLabs
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_elevenlabs(api_key: String, voice_id: String) -> Result<Self> {
        Self::new_elevenlabs_with_model(api_key, voice_id, DEFAULT_ELEVENLABS_MODEL.to_string())
    }

    /// Create a new TTS instance using ElevenLabs with custom model
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_elevenlabs_with_model(
        api_key: String,
        voice_id: String,
        model: String,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for TTS".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: SecretString::from(api_key),
            voice: voice_id,
            speed: 1.0, // ElevenLabs doesn't use speed in the same way
            model,
            settings: VoiceSettings::default(),
            provider: TtsProvider::ElevenLabs,
            base_url: ELEVENLABS_BASE_URL.to_string(),
        })
    }

    /// Build the synthesizer described by `config`
    ///
    /// Returns `None` when the selected provider has no API key.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let voice = &config.voice;
        let Some(key) = config.api_keys.for_tts(voice.provider) else {
            return Ok(None);
        };

        let mut tts = match voice.provider {
            TtsProvider::ElevenLabs => Self::new_elevenlabs_with_model(
                key.to_string(),
                voice.voice.clone(),
                voice.model.clone(),
            )?,
            TtsProvider::OpenAI => Self::new_openai_with_model(
                key.to_string(),
                voice.voice.clone(),
                voice.speed,
                voice.model.clone(),
            )?,
        };

        if let Some(base_url) = &voice.base_url {
            tts = tts.with_base_url(base_url.clone());
        }
        if let Some(timeout) = config.server.upstream_timeout {
            tts = tts.with_timeout(timeout)?;
        }

        Ok(Some(tts))
    }

    /// Point the client at a different host (proxies, tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the ElevenLabs voice settings
    #[must_use]
    pub const fn with_voice_settings(mut self, settings: VoiceSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Apply a request timeout to every synthesis call
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be rebuilt
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Which backend this instance talks to
    #[must_use]
    pub const fn provider(&self) -> TtsProvider {
        self.provider
    }

    /// Synthesize using OpenAI TTS
    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    /// Synthesize using ElevenLabs TTS
    async fn synthesize_elevenlabs(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
            voice_settings: VoiceSettings,
        }

        let url = format!("{}/v1/text-to-speech/{}", self.base_url, self.voice);

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
            voice_settings: self.settings,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", self.api_key.expose_secret())
            .header("Accept", "audio/mpeg")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for TextToSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let audio = match self.provider {
            TtsProvider::OpenAI => self.synthesize_openai(text).await?,
            TtsProvider::ElevenLabs => self.synthesize_elevenlabs(text).await?,
        };

        if audio.is_empty() {
            return Err(Error::Tts(format!(
                "{} returned an empty audio body",
                self.provider.as_str()
            )));
        }

        Ok(audio)
    }

    fn name(&self) -> &'static str {
        self.provider.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_parse() {
        assert_eq!(TtsProvider::parse("ElevenLabs"), Some(TtsProvider::ElevenLabs));
        assert_eq!(TtsProvider::parse(" openai "), Some(TtsProvider::OpenAI));
        assert_eq!(TtsProvider::parse("polly"), None);
    }

    #[test]
    fn default_voice_settings_match_coach_tuning() {
        let settings = VoiceSettings::default();
        assert!((settings.stability - 0.45).abs() < f32::EPSILON);
        assert!((settings.similarity_boost - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(TextToSpeech::new_elevenlabs(String::new(), DEFAULT_ELEVENLABS_VOICE.to_string()).is_err());
        assert!(TextToSpeech::new_openai(String::new(), "alloy".to_string(), 1.0).is_err());
    }

    #[test]
    fn base_url_override_trims_slash() {
        let tts = TextToSpeech::new_elevenlabs("key".to_string(), "voice".to_string())
            .unwrap()
            .with_base_url("http://localhost:1234/");
        assert_eq!(tts.base_url, "http://localhost:1234");
        assert_eq!(tts.provider(), TtsProvider::ElevenLabs);
    }
}
