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
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use uuid::Uuid;

/// An artifact document authored in the knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when updating a document; absent fields are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Thread-safe, file-backed document store.
pub struct DocumentStore {
    documents: RwLock<HashMap<Uuid, Document>>,
    storage_path: PathBuf,
}

impl DocumentStore {
    pub fn open(storage_path: impl AsRef<Path>) -> Self {
        let storage_path = storage_path.as_ref().to_path_buf();

        let documents = if storage_path.exists() {
            match Self::load(&storage_path) {
                Ok(docs) => {
                    info!("Loaded {} documents", docs.len());
                    docs
                }
                Err(e) => {
                    warn!("Failed to load document store: {}. Starting empty.", e);
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Self {
            documents: RwLock::new(documents),
            storage_path,
        }
    }

    pub fn list(&self) -> Vec<Document> {
        let mut docs: Vec<Document> = self.documents.read().values().cloned().collect();
        docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        docs
    }

    pub fn get(&self, id: Uuid) -> Option<Document> {
        self.documents.read().get(&id).cloned()
    }

    pub fn create(&self, title: String, content: String, tags: Vec<String>) -> Document {
        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            title,
            content,
            tags,
            created_at: now,
            updated_at: now,
        };

        self.documents
            .write()
            .insert(document.id, document.clone());
        self.save();

        info!("Created document {}", document.id);
        document
    }

    pub fn update(&self, id: Uuid, update: DocumentUpdate) -> Option<Document> {
        let updated = {
            let mut docs = self.documents.write();
            let doc = docs.get_mut(&id)?;
            if let Some(title) = update.title {
                doc.title = title;
            }
            if let Some(content) = update.content {
                doc.content = content;
            }
            if let Some(tags) = update.tags {
                doc.tags = tags;
            }
            doc.updated_at = Utc::now();
            doc.clone()
        };

        self.save();
        Some(updated)
    }

    pub fn delete(&self, id: Uuid) -> bool {
        let removed = self.documents.write().remove(&id).is_some();
        if removed {
            self.save();
            info!("Deleted document {}", id);
        }
        removed
    }

    fn load(path: &Path) -> Result<HashMap<Uuid, Document>, String> {
        let file = File::open(path).map_err(|e| format!("failed to open document file: {e}"))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| format!("failed to parse document file: {e}"))
    }

    // In-memory state is authoritative; a failed save is logged, not raised.
    fn save(&self) {
        if let Err(e) = self.try_save() {
            error!("Failed to persist document store: {}", e);
        }
    }

    fn try_save(&self) -> Result<(), String> {
        if let Some(parent) = self.storage_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("failed to create document directory: {e}"))?;
        }

        let temp_path = self.storage_path.with_extension("json.tmp");
        {
            let file = File::create(&temp_path)
                .map_err(|e| format!("failed to create temp document file: {e}"))?;
            let writer = BufWriter::new(file);
            let docs = self.documents.read();
            serde_json::to_writer_pretty(writer, &*docs)
                .map_err(|e| format!("failed to serialize documents: {e}"))?;
        }
        fs::rename(&temp_path, &self.storage_path)
            .map_err(|e| format!("failed to rename temp document file: {e}"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::open(temp_dir.path().join("documents.json"));

        let doc = store.create(
            "Fleet overview".to_string(),
            "RCI operates 28 ships".to_string(),
            vec!["fleet".to_string()],
        );

        let fetched = store.get(doc.id).unwrap();
        assert_eq!(fetched.title, "Fleet overview");
        assert_eq!(fetched.tags, vec!["fleet"]);
    }

    #[test]
    fn test_update_partial_fields() {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::open(temp_dir.path().join("documents.json"));

        let doc = store.create("Title".to_string(), "Body".to_string(), vec![]);
        let updated = store
            .update(
                doc.id,
                DocumentUpdate {
                    content: Some("New body".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.title, "Title");
        assert_eq!(updated.content, "New body");
        assert!(updated.updated_at >= doc.updated_at);
    }

    #[test]
    fn test_update_missing_document() {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::open(temp_dir.path().join("documents.json"));
        assert!(store.update(Uuid::new_v4(), DocumentUpdate::default()).is_none());
    }

    #[test]
    fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::open(temp_dir.path().join("documents.json"));

        let doc = store.create("A".to_string(), "B".to_string(), vec![]);
        assert!(store.delete(doc.id));
        assert!(!store.delete(doc.id));
        assert!(store.get(doc.id).is_none());
    }

    #[test]
    fn test_persistence_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("documents.json");

        let id = {
            let store = DocumentStore::open(&path);
            store.create("Persistent".to_string(), "doc".to_string(), vec![]).id
        };

        let reopened = DocumentStore::open(&path);
        assert_eq!(reopened.get(id).unwrap().title, "Persistent");
    }

    #[test]
    fn test_list_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let store = DocumentStore::open(temp_dir.path().join("documents.json"));

        store.create("first".to_string(), String::new(), vec![]);
        std::thread::sleep(std::time::Duration::from_millis(5));
        store.create("second".to_string(), String::new(), vec![]);

        let docs = store.list();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].title, "second");
    }
}
