pub mod adapter;
pub mod config;
pub mod error;
pub mod llm;
pub mod normalizer;
pub mod prompt;
pub mod retry;
pub mod schema;
pub mod validator;

pub use adapter::{BackendHealth, QueryAdapter};
pub use config::{ExtractorConfig, InferenceConfig, RetryConfig};
pub use error::{ConfigError, ExtractionFailed, InferenceError, MalformedResponse, UnsupportedDocumentType};
pub use llm::{ImagePayload, InferenceBackend, MoondreamClient};
pub use normalizer::{AnswerKeyNormalizer, ResponseNormalizer};
pub use prompt::questions_for;
pub use schema::{
    DocumentType, ExtractedFields, ExtractionRecord, FieldKind, FieldSpec, FieldValue, RawAnswer,
};
pub use validator::{Validation, validate};

use futures_util::{StreamExt, stream};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

/// First words that make a presence question count as "present".
pub const AFFIRMATIVE_TOKENS: [&str; 3] = ["yes", "present", "true"];

/// Asks every catalog question for a document and assembles the field map.
pub struct FieldExtractor<B, N = AnswerKeyNormalizer> {
    adapter: QueryAdapter<B, N>,
    max_concurrent_queries: usize,
}

impl<B: InferenceBackend> FieldExtractor<B> {
    pub fn from_config(backend: B, config: &ExtractorConfig) -> Self {
        Self::new(
            QueryAdapter::from_config(backend, config),
            config.max_concurrent_queries,
        )
    }
}

impl<B, N> FieldExtractor<B, N>
where
    B: InferenceBackend,
    N: ResponseNormalizer,
{
    pub fn new(adapter: QueryAdapter<B, N>, max_concurrent_queries: usize) -> Self {
        Self {
            adapter,
            max_concurrent_queries: max_concurrent_queries.max(1),
        }
    }

    pub fn adapter(&self) -> &QueryAdapter<B, N> {
        &self.adapter
    }

    /// Extract every catalog field for one document image.
    ///
    /// Extraction is best-effort per field: a failed query leaves that field
    /// `Unknown`. Only when every query fails is the whole document failed.
    pub async fn extract(
        &self,
        document_type: DocumentType,
        image_bytes: &[u8],
    ) -> Result<ExtractedFields, ExtractionFailed> {
        let specs = questions_for(document_type);
        let image = ImagePayload::encode(image_bytes);
        let adapter = &self.adapter;
        let image = &image;

        // `buffered` keeps catalog order while running up to N queries at once.
        let answers: Vec<_> = stream::iter(specs)
            .map(move |spec| async move {
                let started = Instant::now();
                let answer = adapter.ask(image, spec.question).await;
                debug!(
                    document_type = %document_type,
                    field = spec.name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    ok = answer.is_ok(),
                    "Field query finished"
                );
                (spec, answer)
            })
            .buffered(self.max_concurrent_queries)
            .collect()
            .await;

        let mut fields = BTreeMap::new();
        let mut last_error = None;
        let mut failures = 0;

        for (spec, answer) in answers {
            let value = match answer {
                Ok(raw) => coerce_answer(spec.kind, &raw),
                Err(e) => {
                    warn!(
                        document_type = %document_type,
                        field = spec.name,
                        error = %e,
                        "Field query failed, recording as unknown"
                    );
                    failures += 1;
                    last_error = Some(e);
                    FieldValue::Unknown
                }
            };
            fields.insert(spec.name.to_string(), value);
        }

        if failures == specs.len() {
            if let Some(last_error) = last_error {
                return Err(ExtractionFailed {
                    document_type,
                    attempted: failures,
                    last_error,
                });
            }
        }

        Ok(ExtractedFields {
            document_type,
            fields,
        })
    }
}

/// Turn a backend answer into the field's typed value.
///
/// Presence flags are lossy on purpose: only an answer whose first word is one
/// of [`AFFIRMATIVE_TOKENS`] (case-insensitive) is `true`; everything else,
/// including hedges like "partially visible", is `false`.
pub fn coerce_answer(kind: FieldKind, raw: &RawAnswer) -> FieldValue {
    let text = raw.as_str().trim();
    match kind {
        FieldKind::BooleanPresence => FieldValue::Flag(is_affirmative(text)),
        FieldKind::FreeText | FieldKind::Date => {
            if text.is_empty() || text.eq_ignore_ascii_case(prompt::NOT_FOUND) {
                FieldValue::Unknown
            } else {
                FieldValue::Text(text.to_string())
            }
        }
    }
}

fn is_affirmative(text: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .find(|word| !word.is_empty())
        .is_some_and(|first| {
            AFFIRMATIVE_TOKENS
                .iter()
                .any(|token| first.eq_ignore_ascii_case(token))
        })
}
