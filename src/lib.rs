//! Coach Relay - speaking-practice relay between a browser and hosted AI services
//!
//! The browser transcribes speech and posts each finished utterance, with the
//! conversation so far, to the relay. The relay asks a language model for a
//! coaching reply, renders that reply as speech, and returns both.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Speech Capture Client (web/)            │
//! │   SpeechRecognition  │  Transcript  │  Audio playback │
//! └────────────────────┬────────────────────────────────┘
//!                      │ POST /api/speak {text, history}
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Coaching Relay                      │
//! │   api  │  relay  │  prompt  │  persona  │  config    │
//! └──────────┬──────────────────────────┬───────────────┘
//!            │                          │
//! ┌──────────▼──────────┐    ┌──────────▼──────────────┐
//! │   llm (Gemini)      │    │  voice (ElevenLabs,     │
//! │                     │    │         OpenAI TTS)     │
//! └─────────────────────┘    └─────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod persona;
pub mod prompt;
pub mod relay;
pub mod voice;

pub use config::Config;
pub use conversation::{Role, SpeakRequest, SpeakResponse, Turn};
pub use error::{Error, Result};
pub use llm::{ChatMessage, ChatModel, CompletionRequest, GeminiClient, MessageRole};
pub use persona::Persona;
pub use relay::CoachRelay;
pub use voice::{SpeechSynthesizer, TextToSpeech, TtsProvider};
