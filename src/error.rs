//! Error types for the coaching relay

use thiserror::Error;

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the coaching relay
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Persona file could not be found
    #[error("persona not found: {0}")]
    PersonaNotFound(String),

    /// Language model completion error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
