//! Configuration settings for Periksa.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub speech: SpeechSettings,
    pub chat: ChatSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.periksa".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Generative model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Base URL of the Gemini API.
    pub endpoint: String,
    /// Model identifier used for both analysis and chat.
    pub model: String,
    /// Sampling temperature for document analysis. Kept low for
    /// analytical precision.
    pub analysis_temperature: f32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            analysis_temperature: 0.3,
            timeout_secs: 120,
        }
    }
}

/// Speech recognition and synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// BCP-47 locale for recognition and synthesis.
    pub locale: String,
    /// Speech rate multiplier for synthesis (1.0 = default).
    pub rate: f32,
    /// Pitch multiplier for synthesis (1.0 = default).
    pub pitch: f32,
    /// External command that records one utterance and prints the final
    /// transcript on stdout. Empty disables speech input.
    pub recognize_command: String,
    /// External command used to synthesize speech. Empty disables speech
    /// output.
    pub speak_command: String,
    /// Explicit voice name. When empty, a voice matching the locale is
    /// selected from the synthesizer's catalog if one exists.
    pub voice: String,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            locale: "id-ID".to_string(),
            rate: 1.0,
            pitch: 1.0,
            recognize_command: String::new(),
            speak_command: "espeak-ng".to_string(),
            voice: String::new(),
        }
    }
}

/// Chat session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Maximum number of transcript messages sent as conversation history.
    pub max_history_messages: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            max_history_messages: 30,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Path to a TOML file overriding the default prompts.
    pub custom_file: Option<String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::PeriksaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("periksa")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_roundtrip_through_toml() {
        let settings = Settings::default();
        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model.model, settings.model.model);
        assert_eq!(parsed.speech.locale, "id-ID");
    }

    #[test]
    fn partial_config_uses_defaults() {
        let parsed: Settings = toml::from_str("[model]\nmodel = \"gemini-2.0-flash\"\n").unwrap();
        assert_eq!(parsed.model.model, "gemini-2.0-flash");
        assert_eq!(parsed.model.analysis_temperature, 0.3);
        assert_eq!(parsed.speech.locale, "id-ID");
    }
}
