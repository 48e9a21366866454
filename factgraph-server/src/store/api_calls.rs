// Copyright 2025 Factgraph Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{error, warn};

/// Prompts stored in the audit log are truncated to this many characters.
const PROMPT_AUDIT_LEN: usize = 200;

/// One recorded text-model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCallRecord {
    pub timestamp: DateTime<Utc>,
    pub provider: String,
    pub model: String,
    pub input_tokens: Option<u32>,
    pub output_tokens: Option<u32>,
    /// Leading slice of the prompt, for audit display only
    pub prompt: String,
}

impl ApiCallRecord {
    pub fn new(
        provider: impl Into<String>,
        model: impl Into<String>,
        input_tokens: Option<u32>,
        output_tokens: Option<u32>,
        prompt: &str,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            provider: provider.into(),
            model: model.into(),
            input_tokens,
            output_tokens,
            prompt: prompt.chars().take(PROMPT_AUDIT_LEN).collect(),
        }
    }
}

/// Append-only audit log of outbound text-model calls.
pub struct ApiCallLog {
    calls: RwLock<Vec<ApiCallRecord>>,
    storage_path: PathBuf,
}

impl ApiCallLog {
    pub fn open(storage_path: impl AsRef<Path>) -> Self {
        let storage_path = storage_path.as_ref().to_path_buf();

        let calls = if storage_path.exists() {
            match Self::load(&storage_path) {
                Ok(calls) => calls,
                Err(e) => {
                    warn!("Failed to load API call log: {}. Starting empty.", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Self {
            calls: RwLock::new(calls),
            storage_path,
        }
    }

    /// Append a record. Audit persistence failures are logged, never raised:
    /// an audit problem must not fail the model call it describes.
    pub fn record(&self, record: ApiCallRecord) {
        self.calls.write().push(record);
        if let Err(e) = self.save() {
            error!("Failed to persist API call log: {}", e);
        }
    }

    /// All records, newest first.
    pub fn list(&self) -> Vec<ApiCallRecord> {
        let mut calls = self.calls.read().clone();
        calls.reverse();
        calls
    }

    pub fn count(&self) -> usize {
        self.calls.read().len()
    }

    fn load(path: &Path) -> Result<Vec<ApiCallRecord>, String> {
        let file = File::open(path).map_err(|e| format!("failed to open call log: {e}"))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| format!("failed to parse call log: {e}"))
    }

    fn save(&self) -> Result<(), String> {
        if let Some(parent) = self.storage_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create call log directory: {e}"))?;
        }

        let temp_path = self.storage_path.with_extension("json.tmp");
        {
            let file = File::create(&temp_path)
                .map_err(|e| format!("failed to create temp call log: {e}"))?;
            let writer = BufWriter::new(file);
            let calls = self.calls.read();
            serde_json::to_writer(writer, &*calls)
                .map_err(|e| format!("failed to serialize call log: {e}"))?;
        }
        fs::rename(&temp_path, &self.storage_path)
            .map_err(|e| format!("failed to rename temp call log: {e}"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_record_and_list_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let log = ApiCallLog::open(temp_dir.path().join("api_calls.json"));

        log.record(ApiCallRecord::new("anthropic", "m", Some(10), Some(20), "first"));
        log.record(ApiCallRecord::new("anthropic", "m", None, None, "second"));

        let calls = log.list();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].prompt, "second");
        assert_eq!(calls[1].input_tokens, Some(10));
    }

    #[test]
    fn test_prompt_truncated() {
        let long_prompt = "x".repeat(500);
        let record = ApiCallRecord::new("ollama", "llama2", None, None, &long_prompt);
        assert_eq!(record.prompt.len(), PROMPT_AUDIT_LEN);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("api_calls.json");

        {
            let log = ApiCallLog::open(&path);
            log.record(ApiCallRecord::new("anthropic", "m", None, None, "kept"));
        }

        let reopened = ApiCallLog::open(&path);
        assert_eq!(reopened.count(), 1);
        assert_eq!(reopened.list()[0].prompt, "kept");
    }
}
