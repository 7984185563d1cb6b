use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use extract::ConfigError;
use extract::config::{parse_flag, parse_var};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub mode: BatchMode,
    pub max_concurrent_documents: usize,
    pub max_batch_size: usize,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    Sequential, // One document at a time, predictable backend load
    Concurrent, // Up to `max_concurrent_documents` in flight
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub save_results: bool,
    pub output_dir: PathBuf,
}

impl FromStr for BatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(BatchMode::Sequential),
            "concurrent" => Ok(BatchMode::Concurrent),
            other => Err(format!("expected sequential or concurrent, got {other:?}")),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_results: false,
            output_dir: PathBuf::from("outputs"),
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            mode: BatchMode::Sequential,
            max_concurrent_documents: 4,
            max_batch_size: 50,
            output: OutputConfig::default(),
        }
    }
}

impl BatchConfig {
    pub fn sequential() -> Self {
        Self::default()
    }

    pub fn concurrent(max_concurrent_documents: usize) -> Self {
        Self {
            mode: BatchMode::Concurrent,
            max_concurrent_documents,
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(mode) = parse_var(&lookup, "BATCH_MODE")? {
            config.mode = mode;
        }
        if let Some(limit) = parse_var(&lookup, "MAX_CONCURRENT_DOCUMENTS")? {
            config.max_concurrent_documents = limit;
        }
        if let Some(size) = parse_var(&lookup, "MAX_BATCH_SIZE")? {
            config.max_batch_size = size;
        }
        if let Some(save) = parse_flag(&lookup, "SAVE_EXTRACTED_DATA")? {
            config.output.save_results = save;
        }
        if let Some(dir) = lookup("OUTPUT_FOLDER") {
            config.output.output_dir = PathBuf::from(dir);
        }

        Ok(config)
    }
}
