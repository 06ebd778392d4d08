//! Configuration management for Periksa.

mod prompts;
mod settings;

pub use prompts::{AnalysisPrompt, PersonaPrompt, Prompts, SessionMessages};
pub use settings::{
    ChatSettings, GeneralSettings, ModelSettings, PromptSettings, Settings, SpeechSettings,
};
