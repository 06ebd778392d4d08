//! Session state for the audit workspace.
//!
//! [`Session`] is the single source of truth the presentation layer renders:
//! the active document, analysis status and result, the chat transcript, and
//! the chat loading flag. The orchestrator mutates it; nothing else does.

use crate::document::Document;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// States of a document analysis.
///
/// ```text
/// Idle ──upload──▶ Analyzing ──model ok───▶ Completed
///                            ──model err──▶ Error
/// any state ──reset──▶ Idle
/// ```
///
/// There is no transition from `Completed`/`Error` back to `Analyzing`
/// except through a fresh upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisStatus {
    /// No document uploaded, or session reset.
    #[default]
    Idle,

    /// A document is uploaded and the model request is in flight.
    Analyzing,

    /// Analysis finished; the result text is stored on the session.
    Completed,

    /// Analysis failed; the fallback explanation is stored as the result.
    Error,
}

impl AnalysisStatus {
    /// Returns `true` while an analysis request is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, AnalysisStatus::Analyzing)
    }

    /// Returns `true` once the analysis reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Error)
    }

    /// A short label suitable for the status line.
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisStatus::Idle => "Idle",
            AnalysisStatus::Analyzing => "Analyzing",
            AnalysisStatus::Completed => "Completed",
            AnalysisStatus::Error => "Error",
        }
    }
}

/// Who produced a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Role tag used by the model API ("user" / "model").
    pub fn wire_name(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }
}

/// One transcript entry. Never mutated after creation; insertion order is
/// display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Per-session state, alive from start until reset.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub active_document: Option<Document>,
    pub analysis_result: Option<String>,
    pub analysis_status: AnalysisStatus,
    pub transcript: Vec<Message>,
    pub chat_loading: bool,
    /// Bumped on every reset. Async completions carry the generation they
    /// started under and are discarded when it no longer matches.
    pub generation: u64,
}

impl Session {
    /// Create a fresh session seeded with one greeting message.
    pub fn new(greeting: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            active_document: None,
            analysis_result: None,
            analysis_status: AnalysisStatus::Idle,
            transcript: vec![Message::assistant(greeting)],
            chat_loading: false,
            generation: 0,
        }
    }

    /// Append a message to the transcript.
    pub fn push(&mut self, message: Message) {
        self.transcript.push(message);
    }

    /// Begin analyzing a freshly uploaded document.
    ///
    /// Replaces the active document wholesale, clears any previous result
    /// (`Analyzing` implies no result is set), and records the upload as a
    /// user turn.
    pub fn begin_analysis(&mut self, document: Document, upload_message: &str) {
        self.active_document = Some(document);
        self.analysis_result = None;
        self.analysis_status = AnalysisStatus::Analyzing;
        self.push(Message::user(upload_message));
    }

    /// Store a successful analysis result.
    pub fn complete_analysis(&mut self, result: String, announcement: &str) {
        self.analysis_result = Some(result);
        self.analysis_status = AnalysisStatus::Completed;
        self.push(Message::assistant(announcement));
    }

    /// Record a failed analysis, keeping the session continuable.
    pub fn fail_analysis(&mut self, fallback: &str, apology: &str) {
        self.analysis_result = Some(fallback.to_string());
        self.analysis_status = AnalysisStatus::Error;
        self.push(Message::assistant(apology));
    }

    /// Drop the active document without resetting the session
    /// ("change document").
    pub fn clear_document(&mut self) {
        self.active_document = None;
    }

    /// Reset the session: clear everything, bump the generation, and reseed
    /// the transcript with a single greeting.
    pub fn reset(&mut self, greeting: &str) {
        self.active_document = None;
        self.analysis_result = None;
        self.analysis_status = AnalysisStatus::Idle;
        self.transcript = vec![Message::assistant(greeting)];
        self.chat_loading = false;
        self.generation += 1;
    }

}

/// Thread-safe handle to [`Session`].
///
/// Lock for short critical sections only; never hold the lock across an
/// `.await` point.
pub type SharedSession = Arc<Mutex<Session>>;

/// Construct a [`SharedSession`] seeded with the given greeting.
pub fn new_shared_session(greeting: &str) -> SharedSession {
    Arc::new(Mutex::new(Session::new(greeting)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn doc() -> Document {
        Document::encode("aging.csv", "text/csv", b"a,b\n").unwrap()
    }

    #[test]
    fn new_session_holds_only_the_greeting() {
        let session = Session::new("Halo");
        assert_eq!(session.transcript.len(), 1);
        assert_eq!(session.transcript[0].role, Role::Assistant);
        assert_eq!(session.analysis_status, AnalysisStatus::Idle);
        assert!(session.active_document.is_none());
        assert!(!session.chat_loading);
    }

    #[test]
    fn begin_analysis_clears_previous_result() {
        let mut session = Session::new("Halo");
        session.begin_analysis(doc(), "Mengunggah dokumen: aging.csv");
        session.complete_analysis("hasil".to_string(), "selesai");
        assert_eq!(session.analysis_status, AnalysisStatus::Completed);

        session.begin_analysis(doc(), "Mengunggah dokumen: aging.csv");
        assert_eq!(session.analysis_status, AnalysisStatus::Analyzing);
        assert!(session.analysis_result.is_none());
    }

    #[test]
    fn terminal_states_carry_exactly_one_result() {
        let mut session = Session::new("Halo");
        session.begin_analysis(doc(), "upload");
        session.fail_analysis("gagal", "maaf");
        assert_eq!(session.analysis_status, AnalysisStatus::Error);
        assert_eq!(session.analysis_result.as_deref(), Some("gagal"));
        assert_eq!(session.transcript.last().unwrap().content, "maaf");
    }

    #[test]
    fn reset_reseeds_greeting_and_bumps_generation() {
        let mut session = Session::new("Halo");
        session.begin_analysis(doc(), "upload");
        session.chat_loading = true;
        let generation = session.generation;

        session.reset("Sesi telah direset.");

        assert!(session.active_document.is_none());
        assert!(session.analysis_result.is_none());
        assert_eq!(session.analysis_status, AnalysisStatus::Idle);
        assert_eq!(session.transcript.len(), 1);
        assert_eq!(session.transcript[0].content, "Sesi telah direset.");
        assert!(!session.chat_loading);
        assert_eq!(session.generation, generation + 1);
    }

    #[test]
    fn status_helpers() {
        assert!(AnalysisStatus::Analyzing.is_busy());
        assert!(!AnalysisStatus::Idle.is_busy());
        assert!(AnalysisStatus::Completed.is_terminal());
        assert!(AnalysisStatus::Error.is_terminal());
        assert_eq!(AnalysisStatus::default(), AnalysisStatus::Idle);
    }
}
