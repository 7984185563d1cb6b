use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    pub inference: InferenceConfig,
    pub retry: RetryConfig,
    /// Field queries in flight at once for a single document.
    pub max_concurrent_queries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl InferenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:2020/v1".to_string(),
            model: "moondream2".to_string(),
            timeout_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff_ms: 250,
            max_backoff_ms: 2000,
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            inference: InferenceConfig::default(),
            retry: RetryConfig::default(),
            max_concurrent_queries: 3,
        }
    }
}

impl ExtractorConfig {
    pub fn fast() -> Self {
        Self {
            inference: InferenceConfig {
                timeout_secs: 15,
                ..InferenceConfig::default()
            },
            retry: RetryConfig {
                max_retries: 1,
                initial_backoff_ms: 100,
                max_backoff_ms: 500,
            },
            max_concurrent_queries: 6,
        }
    }

    pub fn thorough() -> Self {
        Self {
            inference: InferenceConfig {
                timeout_secs: 90,
                ..InferenceConfig::default()
            },
            retry: RetryConfig {
                max_retries: 4,
                initial_backoff_ms: 1000,
                max_backoff_ms: 10000,
            },
            max_concurrent_queries: 1,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the known keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(endpoint) = lookup("MOONDREAM_ENDPOINT") {
            config.inference.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        if let Some(model) = lookup("MOONDREAM_MODEL") {
            config.inference.model = model;
        }
        if let Some(timeout) = parse_var(&lookup, "MOONDREAM_TIMEOUT")? {
            config.inference.timeout_secs = timeout;
        }
        if let Some(retries) = parse_var(&lookup, "MOONDREAM_MAX_RETRIES")? {
            config.retry.max_retries = retries;
        }
        if let Some(concurrency) = parse_var(&lookup, "MAX_CONCURRENT_QUERIES")? {
            config.max_concurrent_queries = concurrency;
        }

        Ok(config)
    }
}

pub fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

/// Accepts the boolean spellings `true/false`, `1/0`, `yes/no`, `on/off`.
pub fn parse_flag<F>(lookup: &F, key: &str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
                reason: "expected a boolean".to_string(),
            }),
        },
    }
}
