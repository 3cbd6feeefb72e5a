//! Voice output
//!
//! Speech recognition happens in the browser, so the relay only synthesizes.

mod tts;

pub use tts::{
    DEFAULT_ELEVENLABS_MODEL, DEFAULT_ELEVENLABS_VOICE, TextToSpeech, TtsProvider, VoiceSettings,
};

use async_trait::async_trait;

use crate::Result;

/// Renders reply text as audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize text to speech
    ///
    /// Returns MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails or the provider returns no audio
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
