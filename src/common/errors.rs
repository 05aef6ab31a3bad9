//! Error types for the extraction, enrichment and settlement pipeline

use thiserror::Error;

/// Result type alias using our PipelineError
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for pipeline operations
///
/// Only conditions that abort an operation live here. Advisory outcomes
/// (odds mismatch, no fixture match, unknown market, no livescore match)
/// are carried as values so callers can surface them without aborting.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Provider failed or returned something that cannot be turned into a slip
    #[error("Extraction failed: {0}")]
    ExtractionFailure(String),

    /// Parsing finished without committing a single selection
    #[error("No selections could be extracted from the betslip")]
    EmptySlip,

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// File system errors (replay provider, CLI input/output)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid response from an upstream feed
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Daily request quota of the fixture feed is used up
    #[error("Fixture feed quota exhausted ({limit} requests per day)")]
    QuotaExhausted { limit: u32 },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Slip not present in the store
    #[error("Slip not found: {0}")]
    SlipNotFound(String),

    /// Worker queue is at capacity
    #[error("Task queue is full")]
    QueueFull,

    /// Worker pool has been shut down
    #[error("Task queue is closed")]
    QueueClosed,

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<url::ParseError> for PipelineError {
    fn from(err: url::ParseError) -> Self {
        PipelineError::Configuration(format!("invalid URL: {}", err))
    }
}
