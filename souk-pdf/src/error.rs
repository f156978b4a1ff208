//! Error types for the PDF layout library

use thiserror::Error;

/// Render error types
#[derive(Debug, Error)]
pub enum RenderError {
    /// IO error while writing the document
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Underlying PDF stream error
    #[error("PDF stream error: {0}")]
    Pdf(String),

    /// Font registration failed and no fallback was available
    #[error("Font error: {0}")]
    Font(String),

    /// Invalid document configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type for render operations
pub type RenderResult<T> = Result<T, RenderError>;
