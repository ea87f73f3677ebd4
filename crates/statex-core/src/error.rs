//! Error types for the statex-core library.

use thiserror::Error;

/// Main error type for the statex library.
#[derive(Error, Debug)]
pub enum StatexError {
    /// Request decoding or extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised around statement extraction.
///
/// The pipeline itself never fails on malformed text; these cover the
/// request boundary and internal faults surfaced by callers.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The request could not be understood.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Failed to parse a value.
    #[error("failed to parse {field}: {value}")]
    Parse { field: String, value: String },

    /// Parsing aborted by an internal fault.
    #[error("parsing failed: {0}")]
    Failed(String),
}

/// Result type for the statex library.
pub type Result<T> = std::result::Result<T, StatexError>;
