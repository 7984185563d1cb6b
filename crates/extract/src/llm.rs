use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::InferenceConfig;
use crate::error::{InferenceError, MalformedResponse};

/// Image bytes inlined as a `data:` URL, so the backend never needs a file path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    data_url: String,
    size_bytes: usize,
}

impl ImagePayload {
    pub fn encode(bytes: &[u8]) -> Self {
        let data_url = format!("data:{};base64,{}", sniff_mime(bytes), STANDARD.encode(bytes));
        Self {
            data_url,
            size_bytes: bytes.len(),
        }
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "image/jpeg",
    }
}

/// Vision-language capability: answer a question about an image.
///
/// Returns the backend's payload untouched; shape differences are handled by
/// a [`crate::normalizer::ResponseNormalizer`].
pub trait InferenceBackend: Send + Sync {
    fn query(
        &self,
        image: &ImagePayload,
        question: &str,
    ) -> impl Future<Output = Result<Value, InferenceError>> + Send;

    fn model(&self) -> &str {
        "unknown"
    }
}

impl<T: InferenceBackend> InferenceBackend for Arc<T> {
    fn query(
        &self,
        image: &ImagePayload,
        question: &str,
    ) -> impl Future<Output = Result<Value, InferenceError>> + Send {
        (**self).query(image, question)
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}

/// HTTP client for a Moondream Station style `/query` endpoint.
#[derive(Clone)]
pub struct MoondreamClient {
    base_url: String,
    model: String,
    timeout: Option<Duration>,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    image_url: &'a str,
    question: &'a str,
    stream: bool,
}

impl MoondreamClient {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout: None,
            client: reqwest::Client::new(),
        }
    }

    /// Per-request deadline enforced by the HTTP client itself.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn from_config(config: &InferenceConfig) -> Self {
        Self::new(config.endpoint.clone(), config.model.clone()).with_timeout(config.timeout())
    }

    fn transport_error(&self, error: reqwest::Error) -> InferenceError {
        if error.is_timeout() {
            InferenceError::Timeout(self.timeout.unwrap_or_default())
        } else {
            InferenceError::Transport(error)
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Default for MoondreamClient {
    fn default() -> Self {
        Self::from_config(&InferenceConfig::default())
    }
}

impl InferenceBackend for MoondreamClient {
    async fn query(&self, image: &ImagePayload, question: &str) -> Result<Value, InferenceError> {
        let url = format!("{}/query", self.base_url);

        let request = QueryRequest {
            image_url: image.data_url(),
            question,
            stream: false,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            MalformedResponse::new(format!("response body is not JSON: {e}")).into()
        })
    }

    fn model(&self) -> &str {
        &self.model
    }
}
