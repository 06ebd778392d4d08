//! Error types for Periksa.

use thiserror::Error;

/// Library-level error type for Periksa operations.
#[derive(Error, Debug)]
pub enum PeriksaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported document format: {0}. Supported formats are PDF, JPEG, PNG, WEBP, HEIC, and CSV.")]
    UnsupportedFormat(String),

    #[error("Document too large: {size} bytes (maximum {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Failed to read document: {0}")]
    Read(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Speech is not supported: {0}")]
    NotSupported(String),

    #[error("Speech recognition failed: {0}")]
    Recognition(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Periksa operations.
pub type Result<T> = std::result::Result<T, PeriksaError>;
