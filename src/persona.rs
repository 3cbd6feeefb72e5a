//! Coaching persona
//!
//! A persona is the fixed instruction block prepended to every user turn,
//! plus the generation limits that go with it. One persona is compiled into
//! the binary; a JSON (or legacy TOML) file can replace it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Embedded default persona
const EMBEDDED_COACH: &str = include_str!("../personas/coach.json");

/// Instruction text and generation limits for the coach
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    /// Unique identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Instruction block prepended to the user's utterance
    pub system_prompt: String,

    /// Output token cap for each reply
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Sampling temperature; the provider default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

const fn default_max_output_tokens() -> u32 {
    200
}

impl Persona {
    /// The persona compiled into the binary
    ///
    /// # Errors
    ///
    /// Returns error if the embedded JSON is malformed
    pub fn embedded() -> Result<Self> {
        serde_json::from_str(EMBEDDED_COACH)
            .map_err(|e| Error::Config(format!("embedded persona is invalid: {e}")))
    }

    /// Load a persona from a file (JSON preferred, TOML by extension)
    ///
    /// # Errors
    ///
    /// Returns error if the file is missing or cannot be parsed
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::PersonaNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let persona: Self = if is_toml {
            toml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };

        if persona.system_prompt.trim().is_empty() {
            return Err(Error::Config(format!(
                "persona {} has an empty systemPrompt",
                path.display()
            )));
        }

        tracing::debug!(path = %path.display(), persona_id = %persona.id, "loaded persona file");
        Ok(persona)
    }

    /// Load from `path` if given, otherwise the embedded persona
    ///
    /// # Errors
    ///
    /// Returns error if the chosen source cannot be loaded
    pub fn load(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(Self::embedded, Self::from_file)
    }
}
