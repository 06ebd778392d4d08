//! Periksa - AI-Assisted Receivables Audit
//!
//! A terminal workspace for auditing accounts receivable with a hosted
//! generative model.
//!
//! The name "Periksa" comes from the Indonesian word for "examine."
//!
//! # Overview
//!
//! Periksa allows you to:
//! - Upload a receivables document (PDF, image, or CSV) for a structured
//!   audit analysis
//! - Discuss the findings in an interactive chat session
//! - Ask by voice and have replies spoken aloud
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt management
//! - `document` - Document encoding and validation
//! - `model` - Audit model client (Gemini)
//! - `speech` - Speech recognition and synthesis bridge
//! - `session` - Session state and transcript
//! - `orchestrator` - Session orchestration
//! - `cli` - Command-line interface
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use periksa::config::{Prompts, Settings};
//! use periksa::model::GeminiClient;
//! use periksa::orchestrator::{InputMode, Orchestrator};
//! use periksa::speech::NullSynthesizer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let prompts = Prompts::default();
//!     let model = Arc::new(GeminiClient::new(&settings, prompts.clone())?);
//!     let orchestrator = Orchestrator::new(model, Arc::new(NullSynthesizer), prompts);
//!
//!     orchestrator.upload_file(Path::new("aging.csv")).await?;
//!     orchestrator.send_message("Apa risiko utamanya?", InputMode::Text).await;
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod session;
pub mod speech;

pub use error::{PeriksaError, Result};
