//! Error handling for the resume tailor

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResumeTailorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load prompt template '{}': {reason}", path.display())]
    TemplateLoad { path: PathBuf, reason: String },

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Completion API error: {0}")]
    Upstream(String),

    #[error("Completion request has no messages")]
    EmptyInput,

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("DOCX extraction error: {0}")]
    DocxExtraction(String),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, ResumeTailorError>;

impl ResumeTailorError {
    /// Errors the description workflow swallows as "no description available"
    pub fn is_recoverable_fetch(&self) -> bool {
        matches!(self, ResumeTailorError::Fetch(_))
    }
}
