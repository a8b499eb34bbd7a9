//! Error types for the deminimis-core library.

use thiserror::Error;

/// Main error type for the deminimis library.
#[derive(Error, Debug)]
pub enum DeminimisError {
    /// Fragment input could not be read.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Log or clipboard output failed.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// Identifier validation error.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while loading text fragments.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Failed to read the underlying input.
    #[error("failed to read fragments: {0}")]
    Read(#[from] std::io::Error),

    /// Input was not a JSON array of strings or of string rows.
    #[error("malformed JSON fragments: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by report sinks.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Writing the summary to the clipboard target failed.
    #[error("clipboard write failed: {0}")]
    Clipboard(String),

    /// Writing to the underlying writer failed.
    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),
}

/// Errors related to identifier validation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Wrong length or non-digit characters.
    #[error("invalid P.IVA format {value:?}: {reason}")]
    Format { value: String, reason: String },

    /// Check digit mismatch.
    #[error("invalid P.IVA check digit: {0}")]
    Checksum(String),
}

/// Result type for the deminimis library.
pub type Result<T> = std::result::Result<T, DeminimisError>;
