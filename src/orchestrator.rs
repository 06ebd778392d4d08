//! Session orchestrator for the audit workspace.
//!
//! Owns the mutable [`Session`] and sequences the document encoder, the
//! audit model, and the speech bridge into a consistent user-facing flow.
//! All session mutation funnels through the named operations here; the
//! presentation layer only reads snapshots.
//!
//! Session state sits behind a mutex that is locked for short critical
//! sections and never held across an `.await`. Every operation that awaits
//! the model captures the session generation first and discards its
//! completion if a reset ran in the meantime.

use crate::config::Prompts;
use crate::document::{self, Document};
use crate::error::Result;
use crate::model::AuditModel;
use crate::session::{
    new_shared_session, AnalysisStatus, Message, Role, SharedSession,
};
use crate::speech::{SpeechRecognizer, SpeechSynthesizer};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// How a chat message entered the session.
///
/// Voice intent is attached to the specific outgoing request: the reply to
/// a [`InputMode::Voice`] turn is spoken, and only that reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Text,
    Voice,
}

/// Terminal outcome of an upload operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// Analysis finished and the result is stored on the session.
    Completed,
    /// The model call failed; the fallback explanation is stored instead.
    Failed,
    /// The session was reset while the request was in flight; the
    /// completion was discarded.
    Discarded,
}

/// Terminal outcome of a chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// The assistant reply (or the fixed apology on failure) appended to
    /// the transcript.
    Replied(String),
    /// The session was reset while the request was in flight; the
    /// completion was discarded.
    Discarded,
}

/// The main orchestrator for one audit session.
pub struct Orchestrator {
    session: SharedSession,
    model: Arc<dyn AuditModel>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    prompts: Prompts,
}

impl Orchestrator {
    /// Create an orchestrator with a fresh session seeded with the
    /// greeting message.
    pub fn new(
        model: Arc<dyn AuditModel>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        prompts: Prompts,
    ) -> Self {
        Self {
            session: new_shared_session(&prompts.messages.greeting),
            model,
            synthesizer,
            prompts,
        }
    }

    /// Encode a file from disk and run the upload flow.
    ///
    /// Encoder rejections (unsupported format, size ceiling, read failure)
    /// short-circuit here, before any model call, so the specific
    /// validation reason reaches the user.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn upload_file(&self, path: &Path) -> Result<AnalysisOutcome> {
        let document = document::encode_file(path).await?;
        Ok(self.upload_document(document).await)
    }

    /// Analyze an already-encoded document.
    #[instrument(skip(self, document), fields(document = %document.name))]
    pub async fn upload_document(&self, document: Document) -> AnalysisOutcome {
        let name = document.name.clone();
        let generation = {
            let mut session = self.session.lock().unwrap();
            let upload_message = Prompts::render_name(&self.prompts.messages.upload, &name);
            session.begin_analysis(document.clone(), &upload_message);
            session.generation
        };

        info!("Analyzing document {}", name);
        let result = self.model.analyze(&document).await;

        let mut session = self.session.lock().unwrap();
        if session.generation != generation {
            info!("Discarding analysis result from a superseded session");
            return AnalysisOutcome::Discarded;
        }

        match result {
            Ok(text) => {
                let announcement =
                    Prompts::render_name(&self.prompts.messages.analysis_completed, &name);
                session.complete_analysis(text, &announcement);
                AnalysisOutcome::Completed
            }
            Err(e) => {
                warn!("Analysis failed: {}", e);
                session.fail_analysis(
                    &self.prompts.messages.analysis_fallback,
                    &self.prompts.messages.analysis_apology,
                );
                AnalysisOutcome::Failed
            }
        }
    }

    /// Send one chat turn.
    ///
    /// The user message is appended optimistically and `chat_loading` is
    /// set before the model call; it is cleared as the final state change
    /// on both the success and the failure path. When `mode` is
    /// [`InputMode::Voice`], the reply produced for this turn is spoken.
    #[instrument(skip(self, text), fields(mode = ?mode))]
    pub async fn send_message(&self, text: &str, mode: InputMode) -> ChatOutcome {
        let (generation, history, active_document) = {
            let mut session = self.session.lock().unwrap();
            // Snapshot the transcript before the optimistic append; the new
            // user message travels separately as the current turn.
            let history = session.transcript.clone();
            let active_document = session.active_document.clone();
            session.push(Message::user(text));
            session.chat_loading = true;
            (session.generation, history, active_document)
        };

        let result = self
            .model
            .converse(text, &history, active_document.as_ref())
            .await;

        let reply = {
            let mut session = self.session.lock().unwrap();
            if session.generation != generation {
                info!("Discarding chat response from a superseded session");
                return ChatOutcome::Discarded;
            }

            let reply = match result {
                Ok(text) => {
                    session.push(Message::assistant(text.clone()));
                    text
                }
                Err(e) => {
                    warn!("Chat turn failed: {}", e);
                    let apology = self.prompts.messages.chat_apology.clone();
                    session.push(Message::assistant(apology.clone()));
                    apology
                }
            };
            session.chat_loading = false;
            reply
        };

        if mode == InputMode::Voice {
            if let Err(e) = self.synthesizer.speak(&reply).await {
                warn!("Failed to speak reply: {}", e);
            }
        }

        ChatOutcome::Replied(reply)
    }

    /// One voice round-trip: listen for an utterance, send it as a
    /// voice-sourced turn, and speak the reply.
    ///
    /// Resolves to `None` when nothing was recognized.
    pub async fn voice_turn(
        &self,
        recognizer: &dyn SpeechRecognizer,
    ) -> Result<Option<(String, ChatOutcome)>> {
        match recognizer.listen().await? {
            Some(utterance) => {
                let outcome = self.send_message(&utterance, InputMode::Voice).await;
                Ok(Some((utterance, outcome)))
            }
            None => Ok(None),
        }
    }

    /// Reset the session. Stops any in-flight speech; in-flight model
    /// requests are not cancelled, their completions are discarded by the
    /// generation check.
    #[instrument(skip(self))]
    pub async fn reset(&self) {
        self.synthesizer.stop().await;
        let mut session = self.session.lock().unwrap();
        session.reset(&self.prompts.messages.reset_greeting);
        info!("Session reset");
    }

    /// Drop the active document without resetting the conversation.
    pub fn clear_document(&self) {
        self.session.lock().unwrap().clear_document();
    }

    /// Speak the latest assistant message again.
    pub async fn speak_latest(&self) -> Result<()> {
        let latest = {
            let session = self.session.lock().unwrap();
            session
                .transcript
                .iter()
                .rev()
                .find(|m| m.role == Role::Assistant)
                .map(|m| m.content.clone())
        };
        match latest {
            Some(text) => self.synthesizer.speak(&text).await,
            None => Ok(()),
        }
    }

    /// Stop the current utterance, if any.
    pub async fn stop_speaking(&self) {
        self.synthesizer.stop().await;
    }

    // Snapshot accessors for the presentation layer.

    pub fn status(&self) -> AnalysisStatus {
        self.session.lock().unwrap().analysis_status
    }

    pub fn analysis_result(&self) -> Option<String> {
        self.session.lock().unwrap().analysis_result.clone()
    }

    pub fn active_document(&self) -> Option<Document> {
        self.session.lock().unwrap().active_document.clone()
    }

    pub fn transcript(&self) -> Vec<Message> {
        self.session.lock().unwrap().transcript.clone()
    }

    pub fn chat_loading(&self) -> bool {
        self.session.lock().unwrap().chat_loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PeriksaError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Model fake that replays scripted outcomes and records its inputs.
    struct ScriptedModel {
        outcomes: Mutex<VecDeque<std::result::Result<String, String>>>,
        calls: AtomicUsize,
        last_history_len: AtomicUsize,
    }

    impl ScriptedModel {
        fn replying(replies: &[&str]) -> Self {
            Self {
                outcomes: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
                calls: AtomicUsize::new(0),
                last_history_len: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                outcomes: Mutex::new(VecDeque::from([Err("boom".to_string())])),
                calls: AtomicUsize::new(0),
                last_history_len: AtomicUsize::new(0),
            }
        }

        fn next(&self) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcomes.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(e)) => Err(PeriksaError::Model(e)),
                None => Ok("balasan".to_string()),
            }
        }
    }

    #[async_trait]
    impl AuditModel for ScriptedModel {
        async fn analyze(&self, _document: &Document) -> Result<String> {
            self.next()
        }

        async fn converse(
            &self,
            _message: &str,
            history: &[Message],
            _active_document: Option<&Document>,
        ) -> Result<String> {
            self.last_history_len.store(history.len(), Ordering::SeqCst);
            self.next()
        }
    }

    /// Model fake that blocks until released, for observing in-flight state.
    struct GatedModel {
        started: Notify,
        release: Notify,
    }

    impl GatedModel {
        fn new() -> Self {
            Self {
                started: Notify::new(),
                release: Notify::new(),
            }
        }

        async fn run(&self) -> Result<String> {
            self.started.notify_one();
            self.release.notified().await;
            Ok("hasil terlambat".to_string())
        }
    }

    #[async_trait]
    impl AuditModel for GatedModel {
        async fn analyze(&self, _document: &Document) -> Result<String> {
            self.run().await
        }

        async fn converse(
            &self,
            _message: &str,
            _history: &[Message],
            _active_document: Option<&Document>,
        ) -> Result<String> {
            self.run().await
        }
    }

    /// Synthesizer fake recording every spoken text.
    struct RecordingSynthesizer {
        spoken: Mutex<Vec<String>>,
    }

    impl RecordingSynthesizer {
        fn new() -> Self {
            Self {
                spoken: Mutex::new(Vec::new()),
            }
        }

        fn spoken(&self) -> Vec<String> {
            self.spoken.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for RecordingSynthesizer {
        async fn speak(&self, text: &str) -> Result<()> {
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn stop(&self) {}
    }

    struct ScriptedRecognizer(Option<String>);

    #[async_trait]
    impl SpeechRecognizer for ScriptedRecognizer {
        async fn listen(&self) -> Result<Option<String>> {
            Ok(self.0.clone())
        }
    }

    fn doc() -> Document {
        Document::encode("aging.csv", "text/csv", b"pelanggan,saldo\n").unwrap()
    }

    fn orchestrator(model: Arc<dyn AuditModel>) -> (Orchestrator, Arc<RecordingSynthesizer>) {
        let synthesizer = Arc::new(RecordingSynthesizer::new());
        let orchestrator = Orchestrator::new(model, synthesizer.clone(), Prompts::default());
        (orchestrator, synthesizer)
    }

    #[tokio::test]
    async fn upload_passes_through_analyzing_to_completed() {
        let model = Arc::new(GatedModel::new());
        let (orchestrator, _) = orchestrator(model.clone());
        let orchestrator = Arc::new(orchestrator);

        assert_eq!(orchestrator.status(), AnalysisStatus::Idle);

        let task = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.upload_document(doc()).await })
        };

        model.started.notified().await;
        assert_eq!(orchestrator.status(), AnalysisStatus::Analyzing);
        assert!(orchestrator.analysis_result().is_none());

        model.release.notify_one();
        let outcome = task.await.unwrap();

        assert_eq!(outcome, AnalysisOutcome::Completed);
        assert_eq!(orchestrator.status(), AnalysisStatus::Completed);
        assert_eq!(
            orchestrator.analysis_result().as_deref(),
            Some("hasil terlambat")
        );

        // Greeting, upload record, completion announcement.
        let transcript = orchestrator.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1].role, Role::User);
        assert!(transcript[1].content.contains("aging.csv"));
        assert_eq!(transcript[2].role, Role::Assistant);
        assert!(transcript[2].content.contains("aging.csv"));
    }

    #[tokio::test]
    async fn failed_analysis_stores_fallback_and_apology() {
        let (orchestrator, _) = orchestrator(Arc::new(ScriptedModel::failing()));

        let outcome = orchestrator.upload_document(doc()).await;

        assert_eq!(outcome, AnalysisOutcome::Failed);
        assert_eq!(orchestrator.status(), AnalysisStatus::Error);
        assert_eq!(
            orchestrator.analysis_result(),
            Some(Prompts::default().messages.analysis_fallback)
        );
        let transcript = orchestrator.transcript();
        assert_eq!(
            transcript.last().unwrap().content,
            Prompts::default().messages.analysis_apology
        );
    }

    #[tokio::test]
    async fn encoder_rejection_short_circuits_before_the_model() {
        let model = Arc::new(ScriptedModel::replying(&[]));
        let (orchestrator, _) = orchestrator(model.clone());

        let err = orchestrator
            .upload_file(Path::new("laporan.docx"))
            .await
            .unwrap_err();

        assert!(matches!(err, PeriksaError::UnsupportedFormat(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert_eq!(orchestrator.status(), AnalysisStatus::Idle);
        assert_eq!(orchestrator.transcript().len(), 1);
    }

    #[tokio::test]
    async fn chat_success_grows_transcript_by_two() {
        let model = Arc::new(ScriptedModel::replying(&["Aging adalah daftar umur piutang."]));
        let (orchestrator, _) = orchestrator(model.clone());

        let outcome = orchestrator
            .send_message("Apa itu aging schedule?", InputMode::Text)
            .await;

        assert_eq!(
            outcome,
            ChatOutcome::Replied("Aging adalah daftar umur piutang.".to_string())
        );
        assert!(!orchestrator.chat_loading());

        let transcript = orchestrator.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1].role, Role::User);
        assert_eq!(transcript[2].role, Role::Assistant);

        // History passed to the model is the pre-send snapshot: greeting only.
        assert_eq!(model.last_history_len.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn chat_failure_appends_the_fixed_apology() {
        let (orchestrator, _) = orchestrator(Arc::new(ScriptedModel::failing()));

        let outcome = orchestrator.send_message("Halo?", InputMode::Text).await;

        let apology = Prompts::default().messages.chat_apology;
        assert_eq!(outcome, ChatOutcome::Replied(apology.clone()));
        assert!(!orchestrator.chat_loading());

        let transcript = orchestrator.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[2].content, apology);
    }

    #[tokio::test]
    async fn reset_yields_a_single_greeting() {
        let (orchestrator, _) = orchestrator(Arc::new(ScriptedModel::replying(&["ok", "ok"])));

        orchestrator.upload_document(doc()).await;
        orchestrator.send_message("Halo", InputMode::Text).await;
        orchestrator.reset().await;

        assert!(orchestrator.active_document().is_none());
        assert!(orchestrator.analysis_result().is_none());
        assert_eq!(orchestrator.status(), AnalysisStatus::Idle);

        let transcript = orchestrator.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(
            transcript[0].content,
            Prompts::default().messages.reset_greeting
        );
    }

    #[tokio::test]
    async fn stale_chat_completion_is_discarded_after_reset() {
        let model = Arc::new(GatedModel::new());
        let (orchestrator, _) = orchestrator(model.clone());
        let orchestrator = Arc::new(orchestrator);

        let task = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.send_message("Halo", InputMode::Text).await })
        };

        model.started.notified().await;
        assert!(orchestrator.chat_loading());

        orchestrator.reset().await;
        model.release.notify_one();

        assert_eq!(task.await.unwrap(), ChatOutcome::Discarded);
        assert_eq!(orchestrator.transcript().len(), 1);
        assert!(!orchestrator.chat_loading());
    }

    #[tokio::test]
    async fn stale_analysis_completion_is_discarded_after_reset() {
        let model = Arc::new(GatedModel::new());
        let (orchestrator, _) = orchestrator(model.clone());
        let orchestrator = Arc::new(orchestrator);

        let task = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.upload_document(doc()).await })
        };

        model.started.notified().await;
        orchestrator.reset().await;
        model.release.notify_one();

        assert_eq!(task.await.unwrap(), AnalysisOutcome::Discarded);
        assert_eq!(orchestrator.status(), AnalysisStatus::Idle);
        assert!(orchestrator.analysis_result().is_none());
        assert_eq!(orchestrator.transcript().len(), 1);
    }

    #[tokio::test]
    async fn voice_turn_speaks_exactly_its_own_reply() {
        let model = Arc::new(ScriptedModel::replying(&["jawaban lisan", "jawaban teks"]));
        let (orchestrator, synthesizer) = orchestrator(model);

        orchestrator
            .send_message("Pertanyaan lisan", InputMode::Voice)
            .await;
        assert_eq!(synthesizer.spoken(), vec!["jawaban lisan".to_string()]);

        // A later text-sourced turn stays silent.
        orchestrator
            .send_message("Pertanyaan teks", InputMode::Text)
            .await;
        assert_eq!(synthesizer.spoken().len(), 1);
    }

    #[tokio::test]
    async fn upload_completion_is_never_spoken() {
        let (orchestrator, synthesizer) =
            orchestrator(Arc::new(ScriptedModel::replying(&["hasil analisis"])));

        orchestrator.upload_document(doc()).await;

        assert!(synthesizer.spoken().is_empty());
    }

    #[tokio::test]
    async fn voice_round_trip_sends_the_recognized_utterance() {
        let model = Arc::new(ScriptedModel::replying(&["balasan"]));
        let (orchestrator, synthesizer) = orchestrator(model);

        let recognizer = ScriptedRecognizer(Some("Berapa saldo piutang?".to_string()));
        let turn = orchestrator.voice_turn(&recognizer).await.unwrap();

        let (utterance, outcome) = turn.unwrap();
        assert_eq!(utterance, "Berapa saldo piutang?");
        assert_eq!(outcome, ChatOutcome::Replied("balasan".to_string()));
        assert_eq!(synthesizer.spoken(), vec!["balasan".to_string()]);
    }

    #[tokio::test]
    async fn empty_recognition_sends_nothing() {
        let model = Arc::new(ScriptedModel::replying(&[]));
        let (orchestrator, synthesizer) = orchestrator(model.clone());

        let recognizer = ScriptedRecognizer(None);
        let turn = orchestrator.voice_turn(&recognizer).await.unwrap();

        assert!(turn.is_none());
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
        assert!(synthesizer.spoken().is_empty());
        assert_eq!(orchestrator.transcript().len(), 1);
    }

    #[tokio::test]
    async fn clear_document_keeps_the_conversation() {
        let (orchestrator, _) = orchestrator(Arc::new(ScriptedModel::replying(&["ok"])));

        orchestrator.upload_document(doc()).await;
        assert!(orchestrator.active_document().is_some());

        orchestrator.clear_document();

        assert!(orchestrator.active_document().is_none());
        assert_eq!(orchestrator.transcript().len(), 3);
    }
}
