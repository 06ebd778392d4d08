//! Pre-flight checks before expensive operations.
//!
//! Validates that the API key and any configured speech tools are available
//! before starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{PeriksaError, Result};
use crate::model::API_KEY_ENV;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// One-shot analysis requires the API key.
    Analyze,
    /// The interactive workspace requires the API key.
    Chat,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Analyze | Operation::Chat => {
            check_api_key()?;
        }
    }
    Ok(())
}

/// Check if the Gemini API key is configured.
pub fn check_api_key() -> Result<()> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(PeriksaError::Config(format!(
            "{API_KEY_ENV} is empty. Set it with: export {API_KEY_ENV}='...'"
        ))),
        Err(_) => Err(PeriksaError::Config(format!(
            "{API_KEY_ENV} not set. Set it with: export {API_KEY_ENV}='...'"
        ))),
    }
}

/// Check whether the configured speech synthesis command works.
pub fn check_speech_output(settings: &Settings) -> Result<()> {
    let program = &settings.speech.speak_command;
    if program.is_empty() {
        return Err(PeriksaError::NotSupported(
            "no speech synthesis command configured (speech.speak_command)".to_string(),
        ));
    }
    check_tool(program)
}

/// Check whether a speech recognition command is configured and present.
pub fn check_speech_input(settings: &Settings) -> Result<()> {
    let program = &settings.speech.recognize_command;
    if program.is_empty() {
        return Err(PeriksaError::NotSupported(
            "no speech recognition command configured (speech.recognize_command)".to_string(),
        ));
    }
    check_tool(program)
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(PeriksaError::NotSupported(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PeriksaError::NotSupported(format!("{} not found in PATH", name)))
        }
        Err(e) => Err(PeriksaError::NotSupported(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_speech_input_is_reported() {
        let settings = Settings::default();
        let err = check_speech_input(&settings).unwrap_err();
        assert!(matches!(err, PeriksaError::NotSupported(_)));
    }
}
