//! Command-backed speech recognition and synthesis.
//!
//! Both sides of the bridge shell out to configurable external tools: a
//! recognition command that records one utterance and prints the final
//! transcript, and an espeak-ng-compatible synthesis command. A missing
//! tool surfaces as `NotSupported` rather than a crash.

use super::{Sanitizer, SpeechRecognizer, SpeechSynthesizer};
use crate::config::SpeechSettings;
use crate::error::{PeriksaError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, warn};

/// Base speaking rate in words per minute at `rate = 1.0`.
const BASE_RATE_WPM: f32 = 175.0;

/// Base pitch value at `pitch = 1.0` (espeak-ng scale 0-99).
const BASE_PITCH: f32 = 50.0;

/// One entry of a synthesizer voice catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    pub language: String,
    pub name: String,
}

/// Speech recognition via an external command.
///
/// The command is invoked with the locale as its only argument and must
/// print the final transcript on stdout. Single-shot, final result only.
pub struct CommandRecognizer {
    program: String,
    locale: String,
}

impl CommandRecognizer {
    pub fn from_settings(settings: &SpeechSettings) -> Self {
        Self {
            program: settings.recognize_command.clone(),
            locale: settings.locale.clone(),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for CommandRecognizer {
    async fn listen(&self) -> Result<Option<String>> {
        if self.program.is_empty() {
            return Err(PeriksaError::NotSupported(
                "no speech recognition command configured (speech.recognize_command)".to_string(),
            ));
        }

        debug!("Starting speech recognition ({})", self.locale);

        let result = Command::new(&self.program)
            .arg(&self.locale)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PeriksaError::NotSupported(format!(
                    "recognition command not found: {}",
                    self.program
                )));
            }
            Err(e) => {
                return Err(PeriksaError::Recognition(format!(
                    "{}: {e}",
                    self.program
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PeriksaError::Recognition(stderr.trim().to_string()));
        }

        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if transcript.is_empty() {
            Ok(None)
        } else {
            Ok(Some(transcript))
        }
    }
}

/// Speech synthesis via an espeak-ng-compatible command.
///
/// Holds at most one utterance in flight; starting a new one or calling
/// [`SpeechSynthesizer::stop`] cancels the previous child process.
pub struct CommandSynthesizer {
    program: String,
    locale: String,
    rate: f32,
    pitch: f32,
    configured_voice: Option<String>,
    sanitizer: Sanitizer,
    cancel: Arc<Notify>,
    /// Voice resolved from the catalog. The catalog may load late, so a
    /// failed probe is not cached and selection is retried next utterance.
    resolved_voice: Mutex<Option<String>>,
}

impl CommandSynthesizer {
    pub fn from_settings(settings: &SpeechSettings) -> Self {
        Self {
            program: settings.speak_command.clone(),
            locale: settings.locale.clone(),
            rate: settings.rate,
            pitch: settings.pitch,
            configured_voice: if settings.voice.is_empty() {
                None
            } else {
                Some(settings.voice.clone())
            },
            sanitizer: Sanitizer::new(),
            cancel: Arc::new(Notify::new()),
            resolved_voice: Mutex::new(None),
        }
    }

    /// Pick the voice for the next utterance: explicit config first, then a
    /// catalog voice matching the locale, else the locale's primary subtag.
    async fn voice_argument(&self) -> String {
        if let Some(voice) = &self.configured_voice {
            return voice.clone();
        }

        let mut resolved = self.resolved_voice.lock().await;
        if let Some(voice) = resolved.as_ref() {
            return voice.clone();
        }

        match probe_voice_catalog(&self.program).await {
            Ok(catalog) => {
                if let Some(voice) = select_voice(&catalog, &self.locale) {
                    *resolved = Some(voice.clone());
                    return voice;
                }
            }
            Err(e) => {
                debug!("Voice catalog not available yet: {}", e);
            }
        }

        primary_subtag(&self.locale).to_string()
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    async fn speak(&self, text: &str) -> Result<()> {
        let prose = self.sanitizer.sanitize(text);
        if prose.is_empty() {
            return Ok(());
        }

        // At most one utterance audible: cancel whatever is in flight.
        self.cancel.notify_waiters();

        let voice = self.voice_argument().await;
        let rate_wpm = (BASE_RATE_WPM * self.rate).round() as u32;
        let pitch = (BASE_PITCH * self.pitch).round().clamp(0.0, 99.0) as u32;

        debug!("Speaking {} chars with voice {}", prose.len(), voice);

        let spawned = Command::new(&self.program)
            .arg("-v")
            .arg(&voice)
            .arg("-s")
            .arg(rate_wpm.to_string())
            .arg("-p")
            .arg(pitch.to_string())
            .arg(&prose)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PeriksaError::NotSupported(format!(
                    "synthesis command not found: {}",
                    self.program
                )));
            }
            Err(e) => {
                return Err(PeriksaError::Synthesis(format!("{}: {e}", self.program)));
            }
        };

        tokio::select! {
            status = child.wait() => match status {
                Ok(s) if s.success() => Ok(()),
                Ok(s) => Err(PeriksaError::Synthesis(format!(
                    "{} exited with {s}",
                    self.program
                ))),
                Err(e) => Err(PeriksaError::Synthesis(e.to_string())),
            },
            _ = self.cancel.notified() => {
                if let Err(e) = child.start_kill() {
                    warn!("Failed to stop utterance: {}", e);
                }
                let _ = child.wait().await;
                Ok(())
            }
        }
    }

    async fn stop(&self) {
        self.cancel.notify_waiters();
    }
}

/// List the synthesizer's voices by running `<program> --voices`.
async fn probe_voice_catalog(program: &str) -> Result<Vec<Voice>> {
    let output = Command::new(program)
        .arg("--voices")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|e| PeriksaError::Synthesis(format!("voice catalog probe failed: {e}")))?;

    if !output.status.success() {
        return Err(PeriksaError::Synthesis(
            "voice catalog probe returned an error".to_string(),
        ));
    }

    Ok(parse_voice_catalog(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse an espeak-ng `--voices` listing.
pub fn parse_voice_catalog(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .skip(1) // header row
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return None;
            }
            Some(Voice {
                language: fields[1].to_string(),
                name: fields[3].to_string(),
            })
        })
        .collect()
}

/// Choose a voice for a locale: exact tag match first, then any voice whose
/// language shares the primary subtag.
pub fn select_voice(catalog: &[Voice], locale: &str) -> Option<String> {
    let normalized = locale.replace('_', "-").to_lowercase();
    let primary = primary_subtag(&normalized).to_string();

    catalog
        .iter()
        .find(|v| v.language.to_lowercase() == normalized)
        .or_else(|| {
            catalog.iter().find(|v| {
                let lang = v.language.to_lowercase();
                lang == primary || lang.starts_with(&format!("{primary}-"))
            })
        })
        .map(|v| v.name.clone())
}

fn primary_subtag(locale: &str) -> &str {
    locale
        .split(['-', '_'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(locale)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  id              --/M      Indonesian         poz/id
 5  en-GB           --/M      English_(Great_Britain) gmw/en
 5  en-US           --/M      English_(America)  gmw/en-US
";

    #[test]
    fn parses_espeak_voice_listing() {
        let catalog = parse_voice_catalog(LISTING);
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog[1].language, "id");
        assert_eq!(catalog[1].name, "Indonesian");
    }

    #[test]
    fn selects_voice_by_primary_subtag() {
        let catalog = parse_voice_catalog(LISTING);
        assert_eq!(
            select_voice(&catalog, "id-ID"),
            Some("Indonesian".to_string())
        );
    }

    #[test]
    fn exact_tag_match_wins_over_primary_subtag() {
        let catalog = parse_voice_catalog(LISTING);
        assert_eq!(
            select_voice(&catalog, "en-US"),
            Some("English_(America)".to_string())
        );
    }

    #[test]
    fn missing_locale_selects_nothing() {
        let catalog = parse_voice_catalog(LISTING);
        assert_eq!(select_voice(&catalog, "sv-SE"), None);
    }

    #[test]
    fn underscore_locale_variant_still_matches() {
        let catalog = parse_voice_catalog(LISTING);
        assert_eq!(
            select_voice(&catalog, "id_ID"),
            Some("Indonesian".to_string())
        );
    }

    #[tokio::test]
    async fn empty_recognize_command_is_not_supported() {
        let settings = SpeechSettings::default();
        let recognizer = CommandRecognizer::from_settings(&settings);
        let err = recognizer.listen().await.unwrap_err();
        assert!(matches!(err, PeriksaError::NotSupported(_)));
    }
}
