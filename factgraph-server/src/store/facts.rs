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

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Narrow contract over the canonical fact blob.
///
/// The blob is one unstructured text value, one fact per line. There is no
/// per-fact update: every `set` replaces the whole thing (last writer wins).
pub trait FactStore: Send + Sync {
    /// Current canonical blob; empty string if nothing was ever saved.
    fn get(&self) -> Result<String>;

    /// Replace the canonical blob wholesale.
    fn set(&self, facts: &str) -> Result<()>;
}

/// The singleton on-disk record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FactRecord {
    content: String,
    updated_at: Option<DateTime<Utc>>,
}

/// File-backed fact store holding the one canonical record.
pub struct FileFactStore {
    record: RwLock<FactRecord>,
    storage_path: PathBuf,
}

impl FileFactStore {
    /// Open the store, loading the existing record if the file is present.
    pub fn open(storage_path: impl AsRef<Path>) -> Self {
        let storage_path = storage_path.as_ref().to_path_buf();

        let record = if storage_path.exists() {
            match Self::load(&storage_path) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Failed to load fact store: {}. Starting empty.", e);
                    FactRecord::default()
                }
            }
        } else {
            info!("Fact store file not found, starting empty");
            FactRecord::default()
        };

        Self {
            record: RwLock::new(record),
            storage_path,
        }
    }

    /// Timestamp of the last successful save, if any.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.record.read().updated_at
    }

    fn load(path: &Path) -> Result<FactRecord> {
        let file = File::open(path).context("failed to open fact store file")?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context("failed to parse fact store file")
    }

    fn persist(&self, record: &FactRecord) -> Result<()> {
        if let Some(parent) = self.storage_path.parent() {
            fs::create_dir_all(parent).context("failed to create fact store directory")?;
        }

        // Write to temporary file first, then rename (atomic write pattern)
        let temp_path = self.storage_path.with_extension("json.tmp");
        {
            let file = File::create(&temp_path).context("failed to create temp fact file")?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, record)
                .context("failed to serialize fact record")?;
        }
        fs::rename(&temp_path, &self.storage_path).context("failed to rename temp fact file")?;

        Ok(())
    }
}

impl FactStore for FileFactStore {
    fn get(&self) -> Result<String> {
        Ok(self.record.read().content.clone())
    }

    fn set(&self, facts: &str) -> Result<()> {
        let record = FactRecord {
            content: facts.to_string(),
            updated_at: Some(Utc::now()),
        };

        // Persist first; in-memory state only changes once the write landed,
        // so a failed save leaves readers seeing the previous blob.
        self.persist(&record)?;
        *self.record.write() = record;

        info!("Fact blob saved ({} bytes)", facts.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_store_reads_empty_string() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileFactStore::open(temp_dir.path().join("facts.json"));
        assert_eq!(store.get().unwrap(), "");
        assert!(store.updated_at().is_none());
    }

    #[test]
    fn test_set_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileFactStore::open(temp_dir.path().join("facts.json"));

        store.set("The sky is blue\nWater is wet").unwrap();
        assert_eq!(store.get().unwrap(), "The sky is blue\nWater is wet");
        assert!(store.updated_at().is_some());
    }

    #[test]
    fn test_set_replaces_wholesale() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileFactStore::open(temp_dir.path().join("facts.json"));

        store.set("first blob").unwrap();
        store.set("second blob").unwrap();
        assert_eq!(store.get().unwrap(), "second blob");
    }

    #[test]
    fn test_persistence_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("facts.json");

        {
            let store = FileFactStore::open(&path);
            store.set("durable facts").unwrap();
        }

        let reopened = FileFactStore::open(&path);
        assert_eq!(reopened.get().unwrap(), "durable facts");
        assert!(reopened.updated_at().is_some());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("facts.json");
        fs::write(&path, "not json at all").unwrap();

        let store = FileFactStore::open(&path);
        assert_eq!(store.get().unwrap(), "");
    }
}
