use serde::Serialize;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::ExtractorConfig;
use crate::error::InferenceError;
use crate::llm::{ImagePayload, InferenceBackend};
use crate::normalizer::{AnswerKeyNormalizer, ResponseNormalizer};
use crate::retry::RetryPolicy;
use crate::schema::RawAnswer;

/// 1x1 transparent PNG used by [`QueryAdapter::probe`].
const PROBE_IMAGE: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BackendHealth {
    Healthy,
    Degraded { reason: String },
}

impl BackendHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, BackendHealth::Healthy)
    }
}

/// One question against the backend, with timeout, retry and response normalization.
pub struct QueryAdapter<B, N = AnswerKeyNormalizer> {
    backend: B,
    normalizer: N,
    timeout: Duration,
    retry: RetryPolicy,
}

impl<B: InferenceBackend> QueryAdapter<B> {
    pub fn new(backend: B, timeout: Duration) -> Self {
        Self::with_normalizer(backend, AnswerKeyNormalizer::new(), timeout)
    }

    pub fn from_config(backend: B, config: &ExtractorConfig) -> Self {
        Self::new(backend, config.inference.timeout())
            .with_retry(RetryPolicy::from_config(&config.retry))
    }
}

impl<B, N> QueryAdapter<B, N>
where
    B: InferenceBackend,
    N: ResponseNormalizer,
{
    pub fn with_normalizer(backend: B, normalizer: N, timeout: Duration) -> Self {
        Self {
            backend,
            normalizer,
            timeout,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask one question about an already-encoded image.
    ///
    /// An empty answer is only returned when the backend genuinely answered
    /// with nothing; every failure is an [`InferenceError`].
    pub async fn ask(&self, image: &ImagePayload, question: &str) -> Result<RawAnswer, InferenceError> {
        self.retry
            .retry("inference_query", || self.ask_once(image, question, self.timeout))
            .await
    }

    /// Same as [`ask`](Self::ask) but encodes the image and overrides the timeout.
    pub async fn ask_bytes(
        &self,
        image_bytes: &[u8],
        question: &str,
        limit: Duration,
    ) -> Result<RawAnswer, InferenceError> {
        let image = ImagePayload::encode(image_bytes);
        self.retry
            .retry("inference_query", || self.ask_once(&image, question, limit))
            .await
    }

    async fn ask_once(
        &self,
        image: &ImagePayload,
        question: &str,
        limit: Duration,
    ) -> Result<RawAnswer, InferenceError> {
        // Dropping the query future on expiry cancels just this request.
        let payload = match timeout(limit, self.backend.query(image, question)).await {
            Ok(result) => result?,
            Err(_) => return Err(InferenceError::Timeout(limit)),
        };

        Ok(self.normalizer.normalize(&payload)?)
    }

    /// Send a trivial question to check the backend answers at all.
    pub async fn probe(&self) -> BackendHealth {
        let image = ImagePayload::encode(PROBE_IMAGE);
        match self.ask_once(&image, "Is this image blank?", self.timeout).await {
            Ok(_) => BackendHealth::Healthy,
            Err(e) => BackendHealth::Degraded {
                reason: e.to_string(),
            },
        }
    }
}
