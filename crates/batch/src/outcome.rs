use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use extract::{DocumentType, ExtractionRecord};

/// One document submitted for extraction.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub document_type: DocumentType,
    pub image: Vec<u8>,
    pub filename: Option<String>,
}

impl DocumentInput {
    pub fn new(document_type: DocumentType, image: impl Into<Vec<u8>>) -> Self {
        Self {
            document_type,
            image: image.into(),
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionMetadata {
    pub processed_at: DateTime<Utc>,
    pub processing_time_ms: f64,
    pub model_version: String,
    pub original_filename: Option<String>,
    pub file_size_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failure,
}

/// Result for one batch item. Exactly one of `record` and `error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    pub index: usize,
    pub status: OutcomeStatus,
    pub document_type: DocumentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<ExtractionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: ExtractionMetadata,
}

impl DocumentOutcome {
    pub fn success(index: usize, record: ExtractionRecord, metadata: ExtractionMetadata) -> Self {
        Self {
            index,
            status: OutcomeStatus::Success,
            document_type: record.document_type(),
            record: Some(record),
            error: None,
            metadata,
        }
    }

    pub fn failure(
        index: usize,
        document_type: DocumentType,
        error: String,
        metadata: ExtractionMetadata,
    ) -> Self {
        Self {
            index,
            status: OutcomeStatus::Failure,
            document_type,
            record: None,
            error: Some(error),
            metadata,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Success,
    Partial,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub batch_id: Uuid,
    pub status: BatchStatus,
    pub total_documents: usize,
    pub successful: usize,
    pub failed: usize,
    pub processing_time_ms: f64,
    /// Same length and order as the submitted documents.
    pub results: Vec<DocumentOutcome>,
}

impl BatchResult {
    pub fn from_outcomes(batch_id: Uuid, results: Vec<DocumentOutcome>, processing_time_ms: f64) -> Self {
        let successful = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - successful;
        let status = if failed == 0 {
            BatchStatus::Success
        } else if successful > 0 {
            BatchStatus::Partial
        } else {
            BatchStatus::Error
        };

        Self {
            batch_id,
            status,
            total_documents: results.len(),
            successful,
            failed,
            processing_time_ms,
            results,
        }
    }

    pub fn records(&self) -> impl Iterator<Item = Option<&ExtractionRecord>> {
        self.results.iter().map(|r| r.record.as_ref())
    }
}
