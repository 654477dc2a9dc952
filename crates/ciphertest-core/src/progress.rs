//! JSON persistence for payloads, saved progress and completion records.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::{CompletionRecord, EncryptedPayload};

/// Progress saved between sessions of the same test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestProgress {
    /// Payload fetched earlier, reused instead of fetching again.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_data: Option<EncryptedPayload>,
    /// Score of a finished run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

impl TestProgress {
    pub fn save_json(&self, path: &Path) -> Result<()> {
        write_json(self, path, "progress")
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        read_json(path, "progress")
    }
}

impl EncryptedPayload {
    pub fn save_json(&self, path: &Path) -> Result<()> {
        write_json(self, path, "payload")
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        read_json(path, "payload")
    }
}

impl CompletionRecord {
    pub fn save_json(&self, path: &Path) -> Result<()> {
        write_json(self, path, "completion record")
    }

    pub fn load_json(path: &Path) -> Result<Self> {
        read_json(path, "completion record")
    }
}

fn write_json<T: Serialize>(value: &T, path: &Path, what: &str) -> Result<()> {
    let json =
        serde_json::to_string_pretty(value).with_context(|| format!("failed to serialize {what}"))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write {what} to {}", path.display()))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {what} JSON: {}", path.display()))
}
