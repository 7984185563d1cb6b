pub mod config;
pub mod error;
pub mod outcome;
pub mod store;

pub use config::{BatchConfig, BatchMode, OutputConfig};
pub use error::BatchError;
pub use outcome::{
    BatchResult, BatchStatus, DocumentInput, DocumentOutcome, ExtractionMetadata, OutcomeStatus,
};
pub use store::ResultStore;

use chrono::Utc;
use extract::{
    AnswerKeyNormalizer, DocumentType, ExtractionFailed, ExtractionRecord, FieldExtractor,
    InferenceBackend, ResponseNormalizer, validate,
};
use futures_util::{FutureExt, StreamExt, stream};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

/// Runs extraction and validation over single documents and batches.
pub struct BatchOrchestrator<B, N = AnswerKeyNormalizer> {
    extractor: FieldExtractor<B, N>,
    config: BatchConfig,
    store: Option<ResultStore>,
}

impl<B, N> BatchOrchestrator<B, N>
where
    B: InferenceBackend,
    N: ResponseNormalizer,
{
    pub fn new(extractor: FieldExtractor<B, N>, config: BatchConfig) -> Self {
        let store = config
            .output
            .save_results
            .then(|| ResultStore::new(config.output.output_dir.clone()));

        Self {
            extractor,
            config,
            store,
        }
    }

    pub fn extractor(&self) -> &FieldExtractor<B, N> {
        &self.extractor
    }

    /// Extract and validate a single document.
    pub async fn extract_document(
        &self,
        document_type: DocumentType,
        image_bytes: &[u8],
    ) -> Result<ExtractionRecord, ExtractionFailed> {
        let fields = self.extractor.extract(document_type, image_bytes).await?;
        let validation = validate(document_type, &fields);
        Ok(ExtractionRecord::assemble(fields, validation))
    }

    /// Process every document, in the configured mode.
    ///
    /// A document that fails (or panics) becomes a failure entry; the rest of
    /// the batch is unaffected. Results come back in input order.
    pub async fn run_batch(&self, documents: &[DocumentInput]) -> Result<BatchResult, BatchError> {
        if documents.is_empty() {
            return Err(BatchError::Empty);
        }
        if documents.len() > self.config.max_batch_size {
            return Err(BatchError::TooManyDocuments {
                count: documents.len(),
                max: self.config.max_batch_size,
            });
        }

        let batch_id = Uuid::new_v4();
        let started = Instant::now();

        let mut outcomes: Vec<DocumentOutcome> = match self.config.mode {
            BatchMode::Sequential => {
                let mut outcomes = Vec::with_capacity(documents.len());
                for (index, document) in documents.iter().enumerate() {
                    outcomes.push(self.process(batch_id, index, document).await);
                }
                outcomes
            }
            BatchMode::Concurrent => {
                stream::iter(documents.iter().enumerate())
                    .map(|(index, document)| self.process(batch_id, index, document))
                    .buffer_unordered(self.config.max_concurrent_documents.max(1))
                    .collect()
                    .await
            }
        };

        // Completion order is arbitrary in concurrent mode.
        outcomes.sort_by_key(|outcome| outcome.index);

        let result = BatchResult::from_outcomes(batch_id, outcomes, elapsed_ms(started));
        info!(
            batch_id = %batch_id,
            mode = ?self.config.mode,
            total = result.total_documents,
            successful = result.successful,
            failed = result.failed,
            elapsed_ms = result.processing_time_ms,
            "Batch finished"
        );

        Ok(result)
    }

    async fn process(&self, batch_id: Uuid, index: usize, document: &DocumentInput) -> DocumentOutcome {
        let span = info_span!(
            "document",
            batch_id = %batch_id,
            index,
            document_type = %document.document_type
        );
        let processed_at = Utc::now();
        let started = Instant::now();

        let result = AssertUnwindSafe(
            self.extract_document(document.document_type, &document.image)
                .instrument(span.clone()),
        )
        .catch_unwind()
        .await;

        let metadata = ExtractionMetadata {
            processed_at,
            processing_time_ms: elapsed_ms(started),
            model_version: self.extractor.adapter().backend().model().to_string(),
            original_filename: document.filename.clone(),
            file_size_bytes: document.image.len(),
        };

        let outcome = match result {
            Ok(Ok(record)) => DocumentOutcome::success(index, record, metadata),
            Ok(Err(e)) => {
                span.in_scope(|| warn!(error = %e, "Document extraction failed"));
                DocumentOutcome::failure(index, document.document_type, e.to_string(), metadata)
            }
            Err(panic) => {
                let message = format!("unexpected fault: {}", panic_message(panic.as_ref()));
                span.in_scope(|| warn!(error = %message, "Document extraction panicked"));
                DocumentOutcome::failure(index, document.document_type, message, metadata)
            }
        };

        if let Some(store) = self.store.as_ref().filter(|_| outcome.is_success()) {
            if let Err(e) = store.save(batch_id, &outcome).await {
                span.in_scope(|| warn!(error = %e, "Failed to save extraction result"));
            }
        }

        outcome
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("panic with non-string payload")
}
