//! Configuration management for the coaching relay
//!
//! Precedence for every setting: environment > TOML file > default.

pub mod file;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::llm::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::voice::{DEFAULT_ELEVENLABS_MODEL, DEFAULT_ELEVENLABS_VOICE, TtsProvider};
use crate::{Error, Result};

use self::file::CoachConfigFile;

/// Port used when neither env nor file set one
pub const DEFAULT_PORT: u16 = 5000;

/// Relay configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Completion model configuration
    pub llm: LlmConfig,

    /// Speech synthesis configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// Persona file replacing the embedded coach
    pub persona_file: Option<PathBuf>,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Directory holding the web client; the embedded page is used when unset
    pub static_dir: Option<PathBuf>,

    /// Global requests-per-minute cap; `None` disables rate limiting
    pub rate_limit_per_minute: Option<u32>,

    /// Timeout applied to each upstream call; `None` waits indefinitely
    pub upstream_timeout: Option<Duration>,
}

/// Completion model configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// API base URL
    pub base_url: String,
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Synthesis backend
    pub provider: TtsProvider,

    /// Voice identifier (ElevenLabs voice ID or `OpenAI` voice name)
    pub voice: String,

    /// TTS model
    pub model: String,

    /// Base URL override
    pub base_url: Option<String>,

    /// Speed multiplier (`OpenAI` only, 0.25 to 4.0)
    pub speed: f32,
}

/// API keys for external services
#[derive(Clone, Default)]
pub struct ApiKeys {
    /// Google Generative Language API key
    pub gemini: Option<String>,

    /// `ElevenLabs` API key
    pub elevenlabs: Option<String>,

    /// `OpenAI` API key (TTS only)
    pub openai: Option<String>,
}

impl ApiKeys {
    /// Key for the given synthesis provider
    #[must_use]
    pub fn for_tts(&self, provider: TtsProvider) -> Option<&str> {
        match provider {
            TtsProvider::ElevenLabs => self.elevenlabs.as_deref(),
            TtsProvider::OpenAI => self.openai.as_deref(),
        }
    }
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| if key.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ApiKeys")
            .field("gemini", &redact(&self.gemini))
            .field("elevenlabs", &redact(&self.elevenlabs))
            .field("openai", &redact(&self.openai))
            .finish()
    }
}

/// Treat empty variables as unset
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from the process environment and the default config file
    ///
    /// # Errors
    ///
    /// Returns error if a setting has an invalid value
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();
        Self::from_sources(fc, |name| std::env::var(name).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a setting has an invalid value
    pub fn from_sources<F>(fc: CoachConfigFile, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| non_empty(env(name));

        // API keys (env > toml > None)
        let api_keys = ApiKeys {
            gemini: var("GEMINI_API_KEY")
                .or_else(|| var("GOOGLE_API_KEY"))
                .or(non_empty(fc.api_keys.gemini)),
            elevenlabs: var("ELEVENLABS_API_KEY").or(non_empty(fc.api_keys.elevenlabs)),
            openai: var("OPENAI_API_KEY").or(non_empty(fc.api_keys.openai)),
        };

        // Server config (env > toml > default)
        let port = match var("COACH_PORT").or_else(|| var("PORT")) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| Error::Config(format!("invalid port {raw:?}: {e}")))?,
            None => fc.server.port.unwrap_or(DEFAULT_PORT),
        };

        let rate_limit_per_minute = match var("COACH_RATE_LIMIT") {
            Some(raw) => Some(
                raw.parse::<u32>()
                    .map_err(|e| Error::Config(format!("invalid COACH_RATE_LIMIT {raw:?}: {e}")))?,
            ),
            None => fc.server.rate_limit_per_minute,
        }
        .filter(|rpm| *rpm > 0);

        let upstream_timeout = match var("COACH_UPSTREAM_TIMEOUT") {
            Some(raw) => Some(raw.parse::<u64>().map_err(|e| {
                Error::Config(format!("invalid COACH_UPSTREAM_TIMEOUT {raw:?}: {e}"))
            })?),
            None => fc.server.upstream_timeout_secs,
        }
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);

        let server = ServerConfig {
            port,
            static_dir: var("COACH_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
            rate_limit_per_minute,
            upstream_timeout,
        };

        let llm = LlmConfig {
            model: var("COACH_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            base_url: var("COACH_LLM_BASE_URL")
                .or(fc.llm.base_url)
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
        };

        // Explicit provider wins; otherwise pick whichever has a key
        let provider = match var("COACH_TTS_PROVIDER").or(fc.voice.provider) {
            Some(name) => TtsProvider::parse(&name)
                .ok_or_else(|| Error::Config(format!("unknown TTS provider: {name}")))?,
            None if api_keys.elevenlabs.is_none() && api_keys.openai.is_some() => {
                TtsProvider::OpenAI
            }
            None => TtsProvider::ElevenLabs,
        };

        let (default_voice, default_model) = match provider {
            TtsProvider::ElevenLabs => (DEFAULT_ELEVENLABS_VOICE, DEFAULT_ELEVENLABS_MODEL),
            TtsProvider::OpenAI => ("alloy", "tts-1"),
        };

        let voice = VoiceConfig {
            provider,
            voice: var("COACH_TTS_VOICE")
                .or(fc.voice.voice)
                .unwrap_or_else(|| default_voice.to_string()),
            model: var("COACH_TTS_MODEL")
                .or(fc.voice.model)
                .unwrap_or_else(|| default_model.to_string()),
            base_url: var("COACH_TTS_BASE_URL").or(fc.voice.base_url),
            speed: fc.voice.speed.unwrap_or(1.0).clamp(0.25, 4.0),
        };

        let persona_file = var("COACH_PERSONA_FILE")
            .or(fc.persona_file)
            .map(PathBuf::from);

        Ok(Self {
            server,
            llm,
            voice,
            api_keys,
            persona_file,
        })
    }
}
