//! Gemini `generateContent` client.
//!
//! Talks the REST wire format directly: documents travel as inline base64
//! data tagged with their MIME type, the auditor persona rides along as the
//! system instruction, and chat turns are replayed as role-tagged contents.

use super::AuditModel;
use crate::config::{Prompts, Settings};
use crate::document::Document;
use crate::error::{PeriksaError, Result};
use crate::session::Message;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Check whether the API key is configured.
pub fn is_api_key_configured() -> bool {
    std::env::var(API_KEY_ENV).map(|k| !k.is_empty()).unwrap_or(false)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline(mime_type: &str, data: &str) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Client for the Gemini REST API.
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    analysis_temperature: f32,
    max_history_messages: usize,
    prompts: Prompts,
}

impl GeminiClient {
    /// Build a client from settings and prompts.
    ///
    /// The API key is read from `GEMINI_API_KEY`; the HTTP client carries
    /// the configured per-request timeout.
    pub fn new(settings: &Settings, prompts: Prompts) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                PeriksaError::Config(format!(
                    "{API_KEY_ENV} not set. Set it with: export {API_KEY_ENV}='...'"
                ))
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.model.timeout_secs))
            .build()
            .map_err(|e| PeriksaError::Model(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: settings.model.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.model.clone(),
            api_key,
            analysis_temperature: settings.model.analysis_temperature,
            max_history_messages: settings.chat.max_history_messages,
            prompts,
        })
    }

    fn request_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }

    fn system_instruction(&self) -> Content {
        Content {
            role: None,
            parts: vec![Part::text(self.prompts.persona.system.as_str())],
        }
    }

    async fn generate(&self, request: &GenerateContentRequest) -> Result<String> {
        let response = self
            .client
            .post(self.request_url())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| PeriksaError::Model(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PeriksaError::Model(format!(
                "API returned status {status}: {}",
                body.chars().take(300).collect::<String>()
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| PeriksaError::Model(format!("failed to parse response: {e}")))?;

        extract_text(body)
            .ok_or_else(|| PeriksaError::Model("model returned no usable text".to_string()))
    }
}

#[async_trait]
impl AuditModel for GeminiClient {
    #[instrument(skip(self, document), fields(document = %document.name))]
    async fn analyze(&self, document: &Document) -> Result<String> {
        debug!(
            "Analyzing {} ({}, {} bytes)",
            document.name, document.mime_type, document.size
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::inline(&document.mime_type, &document.data),
                    Part::text(self.prompts.analysis.instruction.as_str()),
                ],
            }],
            system_instruction: Some(self.system_instruction()),
            generation_config: Some(GenerationConfig {
                temperature: self.analysis_temperature,
            }),
        };

        self.generate(&request).await
    }

    #[instrument(skip(self, message, history, active_document))]
    async fn converse(
        &self,
        message: &str,
        history: &[Message],
        active_document: Option<&Document>,
    ) -> Result<String> {
        let start = history.len().saturating_sub(self.max_history_messages);

        let mut contents: Vec<Content> = history[start..]
            .iter()
            .map(|m| Content {
                role: Some(m.role.wire_name().to_string()),
                parts: vec![Part::text(m.content.as_str())],
            })
            .collect();

        let mut parts = vec![Part::text(message)];
        if let Some(document) = active_document {
            // The document bytes live earlier in the conversation at best;
            // remind the model which document is in scope for this turn.
            parts.push(Part::text(Prompts::render_name(
                &self.prompts.analysis.document_reminder,
                &document.name,
            )));
        }
        contents.push(Content {
            role: Some("user".to_string()),
            parts,
        });

        let request = GenerateContentRequest {
            contents,
            system_instruction: Some(self.system_instruction()),
            generation_config: None,
        };

        self.generate(&request).await
    }
}

/// Pull the first text part out of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|content| content.parts.into_iter().find_map(|p| p.text))
        .filter(|text| !text.trim().is_empty())
}
