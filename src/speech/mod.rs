//! Speech bridge for Periksa.
//!
//! Wraps platform speech-to-text and text-to-speech behind small async
//! traits. Each operation resolves to a single terminal outcome (result,
//! cancel, or error); at most one recognition and one synthesis are active
//! at any instant.

mod command;
mod sanitize;

pub use command::{parse_voice_catalog, select_voice, CommandRecognizer, CommandSynthesizer, Voice};
pub use sanitize::Sanitizer;

use crate::error::Result;
use async_trait::async_trait;

/// Single-shot speech recognition in a fixed locale.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Capture one utterance and resolve to its final transcript.
    ///
    /// Resolves to `Ok(None)` when the utterance was empty or cancelled,
    /// and to an error when recognition fails or is unavailable.
    async fn listen(&self) -> Result<Option<String>>;
}

/// Speech synthesis. At most one utterance is audible at a time.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak the given text, cancelling any in-flight utterance first.
    ///
    /// The future resolves exactly once per utterance, whether it ends
    /// normally, is stopped, or errors. Input is sanitized before
    /// synthesis.
    async fn speak(&self, text: &str) -> Result<()>;

    /// Cancel the current utterance, if any.
    async fn stop(&self);
}

/// Synthesizer used when speech output is disabled; discards all utterances.
pub struct NullSynthesizer;

#[async_trait]
impl SpeechSynthesizer for NullSynthesizer {
    async fn speak(&self, _text: &str) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) {}
}
