//! Error types for huntly.

use thiserror::Error;

/// Result type alias using huntly's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a field extraction produced no usable candidate.
///
/// These are deterministic given the same model output, so they are never
/// retried; the message is skipped and the failure recorded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionFailure {
    /// Model output did not decode as the expected JSON payload.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Status value outside the five-state enum.
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// Required key missing or empty in the payload.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Generation service failed after retries.
    #[error("generation service failed: {0}")]
    Service(String),
}

/// Core error type for huntly operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transient service failure (rate limit, timeout). Retryable.
    #[error("Transient service error: {0}")]
    Transient(String),

    /// Inference/generation failed (non-transient)
    #[error("Inference error: {0}")]
    Inference(String),

    /// Field extraction produced no usable candidate
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionFailure),

    /// Candidate failed merge preconditions; no store mutation happened
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record store query/create/update failed
    #[error("Store error: {0}")]
    Store(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a retry with backoff could help.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transient(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            Error::Transient(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}
