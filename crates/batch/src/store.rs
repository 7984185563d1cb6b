use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::outcome::DocumentOutcome;

/// Writes document outcomes as pretty JSON files.
#[derive(Debug, Clone)]
pub struct ResultStore {
    output_dir: PathBuf,
}

impl ResultStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub async fn save(&self, batch_id: Uuid, outcome: &DocumentOutcome) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;

        let path = self.output_dir.join(file_name_for(batch_id, outcome));
        let json = serde_json::to_string_pretty(outcome)
            .context("Failed to serialize extraction outcome")?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }
}

/// `<stem>_<YYYYmmdd_HHMMSS>_<batch>_<index>.json`, stem from the original
/// filename and `<batch>` the first eight hex digits of the batch id.
fn file_name_for(batch_id: Uuid, outcome: &DocumentOutcome) -> String {
    let stem = outcome
        .metadata
        .original_filename
        .as_deref()
        .and_then(|name| Path::new(name).file_stem())
        .and_then(|stem| stem.to_str())
        .map(|stem| {
            stem.chars()
                .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                .collect::<String>()
        })
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "extraction".to_string());

    let batch = batch_id.simple().to_string();
    format!(
        "{}_{}_{}_{}.json",
        stem,
        outcome.metadata.processed_at.format("%Y%m%d_%H%M%S"),
        &batch[..8],
        outcome.index
    )
}
