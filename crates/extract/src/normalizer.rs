use serde_json::Value;

use crate::error::MalformedResponse;
use crate::schema::RawAnswer;

/// Keys the backend has been seen to put its answer under, highest priority first.
pub const ANSWER_KEYS: [&str; 4] = ["answer", "response", "text", "content"];

/// Turns a raw backend payload into a single text answer.
pub trait ResponseNormalizer: Send + Sync {
    fn normalize(&self, payload: &Value) -> Result<RawAnswer, MalformedResponse>;
}

/// Looks for the answer under a fixed, ordered list of keys.
#[derive(Debug, Clone)]
pub struct AnswerKeyNormalizer {
    keys: Vec<String>,
}

impl AnswerKeyNormalizer {
    pub fn new() -> Self {
        Self::with_keys(ANSWER_KEYS)
    }

    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for AnswerKeyNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseNormalizer for AnswerKeyNormalizer {
    fn normalize(&self, payload: &Value) -> Result<RawAnswer, MalformedResponse> {
        let object = payload.as_object().ok_or_else(|| {
            MalformedResponse::new(format!("expected a JSON object, got {}", kind_of(payload)))
        })?;

        for key in &self.keys {
            // Null and nested structures under a candidate key are not answers; keep looking.
            match object.get(key) {
                Some(Value::String(text)) => return Ok(RawAnswer::new(text.clone())),
                Some(Value::Number(n)) => return Ok(RawAnswer::new(n.to_string())),
                Some(Value::Bool(b)) => return Ok(RawAnswer::new(b.to_string())),
                Some(Value::Null | Value::Array(_) | Value::Object(_)) | None => continue,
            }
        }

        let mut present: Vec<&str> = object.keys().map(String::as_str).collect();
        present.sort_unstable();
        Err(MalformedResponse::new(format!(
            "none of [{}] holds a scalar answer (keys present: [{}])",
            self.keys.join(", "),
            present.join(", ")
        )))
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
