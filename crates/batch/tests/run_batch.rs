//! Batch orchestration over a deterministic in-memory backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use batch::{
    BatchConfig, BatchError, BatchOrchestrator, BatchStatus, DocumentInput,
    OutcomeStatus,
};
use extract::{
    DocumentType, FieldExtractor, FieldValue, ImagePayload, InferenceBackend, InferenceError,
    QueryAdapter, questions_for,
};

#[derive(Clone)]
enum Card {
    Readable { number: &'static str, delay_ms: u64 },
    Unreachable,
    Panics,
}

/// Answers depend on which image is asked about.
#[derive(Clone, Default)]
struct CardBackend {
    cards: HashMap<String, Card>,
}

impl CardBackend {
    fn with_card(mut self, image: &[u8], card: Card) -> Self {
        self.cards
            .insert(ImagePayload::encode(image).data_url().to_string(), card);
        self
    }
}

fn field_for(question: &str) -> &'static str {
    DocumentType::ALL
        .iter()
        .flat_map(|t| questions_for(*t))
        .find(|spec| spec.question == question)
        .map(|spec| spec.name)
        .expect("question comes from the catalog")
}

impl InferenceBackend for CardBackend {
    async fn query(&self, image: &ImagePayload, question: &str) -> Result<Value, InferenceError> {
        let card = self.cards.get(image.data_url()).cloned().unwrap_or(Card::Unreachable);
        match card {
            Card::Readable { number, delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                let answer = match field_for(question) {
                    "pan_number" | "aadhaar_number" => number,
                    "signature_present" | "qr_code_present" => "Yes",
                    "date_of_birth" => "01/01/1990",
                    _ => "RAHUL GUPTA",
                };
                Ok(json!({ "response": answer }))
            }
            Card::Unreachable => Err(InferenceError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            }),
            Card::Panics => panic!("decoder blew up"),
        }
    }

    fn model(&self) -> &str {
        "moondream2"
    }
}

fn orchestrator(backend: Arc<CardBackend>, config: BatchConfig) -> BatchOrchestrator<Arc<CardBackend>> {
    let adapter = QueryAdapter::new(backend, Duration::from_secs(2));
    BatchOrchestrator::new(FieldExtractor::new(adapter, 3), config)
}

fn three_card_backend() -> CardBackend {
    CardBackend::default()
        .with_card(b"first", Card::Readable { number: "ABCDE1234F", delay_ms: 60 })
        .with_card(b"second", Card::Unreachable)
        .with_card(b"third", Card::Readable { number: "1234 5678 9012", delay_ms: 0 })
}

fn three_documents() -> Vec<DocumentInput> {
    vec![
        DocumentInput::new(DocumentType::Pan, b"first".to_vec()).with_filename("first.jpg"),
        DocumentInput::new(DocumentType::Pan, b"second".to_vec()).with_filename("second.jpg"),
        DocumentInput::new(DocumentType::Aadhaar, b"third".to_vec()).with_filename("third.png"),
    ]
}

#[tokio::test]
async fn test_failed_document_does_not_affect_siblings() {
    let orchestrator = orchestrator(Arc::new(three_card_backend()), BatchConfig::sequential());
    let result = orchestrator.run_batch(&three_documents()).await.unwrap();

    assert_eq!(result.results.len(), 3);
    let statuses: Vec<_> = result.results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![OutcomeStatus::Success, OutcomeStatus::Failure, OutcomeStatus::Success]
    );
    assert_eq!(result.status, BatchStatus::Partial);
    assert_eq!((result.successful, result.failed), (2, 1));

    let failure = &result.results[1];
    assert!(failure.record.is_none());
    assert!(failure.error.as_deref().unwrap().contains("all 5 field queries failed"));

    let pan = result.results[0].record.as_ref().unwrap();
    assert!(pan.is_valid());
    assert_eq!(pan.normalized_value(), Some("ABCDE1234F"));

    let aadhaar = result.results[2].record.as_ref().unwrap();
    assert!(aadhaar.is_valid());
    assert_eq!(aadhaar.normalized_value(), Some("123456789012"));
    assert_eq!(aadhaar.get("qr_code_present").and_then(FieldValue::as_flag), Some(true));
}

#[tokio::test]
async fn test_concurrent_mode_matches_sequential_order() {
    let backend = Arc::new(three_card_backend());
    let documents = three_documents();

    let sequential = orchestrator(backend.clone(), BatchConfig::sequential())
        .run_batch(&documents)
        .await
        .unwrap();
    let concurrent = orchestrator(backend, BatchConfig::concurrent(3))
        .run_batch(&documents)
        .await
        .unwrap();

    let indices: Vec<_> = concurrent.results.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);

    let filenames: Vec<_> = concurrent
        .results
        .iter()
        .map(|r| r.metadata.original_filename.clone().unwrap())
        .collect();
    assert_eq!(filenames, vec!["first.jpg", "second.jpg", "third.png"]);

    assert!(sequential.records().eq(concurrent.records()));
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let orchestrator = orchestrator(Arc::new(three_card_backend()), BatchConfig::concurrent(2));
    let documents = three_documents();

    let first = orchestrator.run_batch(&documents).await.unwrap();
    let second = orchestrator.run_batch(&documents).await.unwrap();

    assert_ne!(first.batch_id, second.batch_id);
    assert!(first.records().eq(second.records()));
    let errors = |r: &batch::BatchResult| r.results.iter().map(|o| o.error.clone()).collect::<Vec<_>>();
    assert_eq!(errors(&first), errors(&second));
}

#[tokio::test]
async fn test_panicking_document_is_contained() {
    let backend = CardBackend::default()
        .with_card(b"good", Card::Readable { number: "ABCDE1234F", delay_ms: 0 })
        .with_card(b"bad", Card::Panics);
    let documents = vec![
        DocumentInput::new(DocumentType::Pan, b"bad".to_vec()),
        DocumentInput::new(DocumentType::Pan, b"good".to_vec()),
    ];

    for config in [BatchConfig::sequential(), BatchConfig::concurrent(2)] {
        let result = orchestrator(Arc::new(backend.clone()), config)
            .run_batch(&documents)
            .await
            .unwrap();

        assert_eq!(result.results[0].status, OutcomeStatus::Failure);
        assert!(result.results[0].error.as_deref().unwrap().contains("decoder blew up"));
        assert_eq!(result.results[1].status, OutcomeStatus::Success);
    }
}

#[tokio::test]
async fn test_all_failures_is_error_status() {
    let orchestrator = orchestrator(Arc::new(CardBackend::default()), BatchConfig::sequential());
    let documents = vec![
        DocumentInput::new(DocumentType::Pan, b"x".to_vec()),
        DocumentInput::new(DocumentType::Aadhaar, b"y".to_vec()),
    ];

    let result = orchestrator.run_batch(&documents).await.unwrap();
    assert_eq!(result.status, BatchStatus::Error);
    assert_eq!(result.total_documents, 2);
    assert_eq!(result.failed, 2);
}

#[tokio::test]
async fn test_batch_limits() {
    let config = BatchConfig {
        max_batch_size: 2,
        ..BatchConfig::sequential()
    };
    let orchestrator = orchestrator(Arc::new(three_card_backend()), config);

    assert_eq!(orchestrator.run_batch(&[]).await.unwrap_err(), BatchError::Empty);
    assert_eq!(
        orchestrator.run_batch(&three_documents()).await.unwrap_err(),
        BatchError::TooManyDocuments { count: 3, max: 2 }
    );
}

#[tokio::test]
async fn test_metadata_is_filled() {
    let orchestrator = orchestrator(Arc::new(three_card_backend()), BatchConfig::sequential());
    let result = orchestrator.run_batch(&three_documents()).await.unwrap();

    let metadata = &result.results[2].metadata;
    assert_eq!(metadata.model_version, "moondream2");
    assert_eq!(metadata.file_size_bytes, b"third".len());
    assert_eq!(metadata.original_filename.as_deref(), Some("third.png"));
    assert!(metadata.processing_time_ms >= 0.0);
}

#[tokio::test]
async fn test_single_document_extraction() {
    let orchestrator = orchestrator(Arc::new(three_card_backend()), BatchConfig::default());

    let record = orchestrator
        .extract_document(DocumentType::Pan, b"first")
        .await
        .unwrap();
    assert_eq!(record.fields().len(), questions_for(DocumentType::Pan).len());
    assert_eq!(record.get("name"), Some(&FieldValue::Text("RAHUL GUPTA".into())));

    let err = orchestrator
        .extract_document(DocumentType::Pan, b"second")
        .await
        .unwrap_err();
    assert_eq!(err.document_type, DocumentType::Pan);
}

#[tokio::test]
async fn test_invalid_identifier_is_still_success() {
    let backend = CardBackend::default()
        .with_card(b"lower", Card::Readable { number: "abcde1234f", delay_ms: 0 });
    let orchestrator = orchestrator(Arc::new(backend), BatchConfig::sequential());

    let result = orchestrator
        .run_batch(&[DocumentInput::new(DocumentType::Pan, b"lower".to_vec())])
        .await
        .unwrap();

    let record = result.results[0].record.as_ref().unwrap();
    assert_eq!(result.results[0].status, OutcomeStatus::Success);
    assert!(!record.is_valid());
    assert_eq!(record.normalized_value(), None);
}

#[tokio::test]
async fn test_successful_results_are_saved() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = BatchConfig::sequential();
    config.output.save_results = true;
    config.output.output_dir = dir.path().to_path_buf();

    let orchestrator = orchestrator(Arc::new(three_card_backend()), config);
    orchestrator.run_batch(&three_documents()).await.unwrap();

    let mut saved: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    saved.sort();

    assert_eq!(saved.len(), 2);
    assert!(saved[0].starts_with("first_") && saved[0].ends_with("_0.json"));
    assert!(saved[1].starts_with("third_") && saved[1].ends_with("_2.json"));
}
