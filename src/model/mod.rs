//! Audit model client for Periksa.
//!
//! The generative model behind document analysis and chat, exposed as a
//! trait so the orchestrator and tests depend on the seam rather than the
//! wire client.

mod gemini;

pub use gemini::{is_api_key_configured, GeminiClient, API_KEY_ENV};

use crate::document::Document;
use crate::error::Result;
use crate::session::Message;
use async_trait::async_trait;

/// Trait for the hosted generative model.
///
/// Both operations are pure with respect to local state: they read their
/// inputs and return generated text. All session mutation happens in the
/// orchestrator.
#[async_trait]
pub trait AuditModel: Send + Sync {
    /// Run the structured audit analysis over one document.
    async fn analyze(&self, document: &Document) -> Result<String>;

    /// Answer a chat turn given the prior transcript and the active
    /// document, if any.
    async fn converse(
        &self,
        message: &str,
        history: &[Message],
        active_document: Option<&Document>,
    ) -> Result<String>;
}
