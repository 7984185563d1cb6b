use std::time::Duration;
use thiserror::Error;

use crate::schema::DocumentType;

/// Backend payload carried none of the recognized answer keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed inference response: {reason}")]
pub struct MalformedResponse {
    pub reason: String,
}

impl MalformedResponse {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Failure of a single inference query.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference query timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Malformed(#[from] MalformedResponse),

    #[error("inference backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("inference request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl InferenceError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, InferenceError::Timeout(_))
    }

    /// Transport faults and 5xx statuses may succeed on another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            InferenceError::Transport(_) => true,
            InferenceError::Status { status, .. } => *status >= 500,
            InferenceError::Timeout(_) | InferenceError::Malformed(_) => false,
        }
    }
}

/// Every field query for a document failed.
#[derive(Debug, Error)]
#[error("extraction failed for {document_type} document: all {attempted} field queries failed, last error: {last_error}")]
pub struct ExtractionFailed {
    pub document_type: DocumentType,
    pub attempted: usize,
    #[source]
    pub last_error: InferenceError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported document type: {0:?}")]
pub struct UnsupportedDocumentType(pub String);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}
