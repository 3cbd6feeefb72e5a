//! TOML configuration file loading
//!
//! Supports `~/.config/coach/config.toml` as a persistent config source.
//! Every field is optional; the file overlays the built-in defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct CoachConfigFile {
    /// Path to a persona JSON/TOML file replacing the embedded coach
    #[serde(default)]
    pub persona_file: Option<String>,

    /// LLM configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Speech synthesis configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gemini-2.5-flash")
    pub model: Option<String>,

    /// API base URL
    pub base_url: Option<String>,
}

/// Speech synthesis configuration
#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    /// Provider ("elevenlabs" or "openai")
    pub provider: Option<String>,

    /// Voice identifier
    pub voice: Option<String>,

    /// TTS model
    pub model: Option<String>,

    /// API base URL
    pub base_url: Option<String>,

    /// Speed multiplier (`OpenAI` only)
    pub speed: Option<f32>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub gemini: Option<String>,
    pub elevenlabs: Option<String>,
    pub openai: Option<String>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Directory holding the built web client
    pub static_dir: Option<String>,

    /// Requests per minute across all clients; unset disables limiting
    pub rate_limit_per_minute: Option<u32>,

    /// Timeout for each upstream call; unset waits indefinitely
    pub upstream_timeout_secs: Option<u64>,
}

/// Load the TOML config file from the standard path
///
/// Returns `CoachConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> CoachConfigFile {
    config_file_path().map_or_else(CoachConfigFile::default, |path| load_config_from(&path))
}

/// Load a TOML config file from an explicit path, falling back to defaults
pub fn load_config_from(path: &Path) -> CoachConfigFile {
    if !path.exists() {
        return CoachConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                CoachConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            CoachConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/coach/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("coach").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn partial_file_parses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nport = 8080\n\n[voice]\nprovider = \"openai\"\nspeed = 1.25"
        )
        .unwrap();

        let config = load_config_from(file.path());
        assert_eq!(config.server.port, Some(8080));
        assert_eq!(config.voice.provider.as_deref(), Some("openai"));
        assert_eq!(config.voice.speed, Some(1.25));
        assert!(config.llm.model.is_none());
        assert!(config.persona_file.is_none());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nport = ").unwrap();

        let config = load_config_from(file.path());
        assert!(config.server.port.is_none());
    }

    #[test]
    fn missing_file_is_default() {
        let config = load_config_from(Path::new("/nonexistent/coach/config.toml"));
        assert!(config.api_keys.gemini.is_none());
    }
}
