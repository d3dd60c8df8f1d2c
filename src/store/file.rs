//! Directory-backed document store: one pretty-printed JSON file per document.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;

use super::{sort_by_recency, stamp, DocumentStore, IdLocks};
use crate::error::{Error, Result};
use crate::input::{parse_str_with_options, ParseOptions};
use crate::model::{Document, DocumentSummary};

const EXTENSION: &str = "json";

/// Stores documents as `<dir>/<id>.json`.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    locks: IdLocks,
}

impl FileStore {
    /// Open a store in `dir`, creating the directory if needed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            locks: IdLocks::default(),
        })
    }

    /// The backing directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::InvalidInput(format!("invalid document id: {:?}", id)));
        }
        Ok(self.dir.join(format!("{}.{}", id, EXTENSION)))
    }

    async fn read(&self, path: &Path, id: &str) -> Result<Document> {
        let json = match fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let mut doc = parse_str_with_options(&json, &ParseOptions::default())
            .map_err(|e| Error::Storage(format!("{}: {}", path.display(), e)))?;
        if doc.id.is_empty() {
            doc.id = id.to_string();
        }
        Ok(doc)
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn load(&self, id: &str) -> Result<Document> {
        let path = self.path_for(id)?;
        self.read(&path, id).await
    }

    async fn save(&self, doc: &Document) -> Result<Document> {
        let id = if doc.id.is_empty() {
            super::new_id()
        } else {
            doc.id.clone()
        };
        let path = self.path_for(&id)?;
        let _guard = self.locks.acquire(&id).await;

        let previous = match self.read(&path, &id).await {
            Ok(existing) => existing.created_at,
            Err(Error::NotFound(_)) => None,
            Err(e) => {
                log::warn!("Overwriting unreadable document {}: {}", id, e);
                None
            }
        };
        let mut stored = doc.clone();
        stored.id = id;
        let stored = stamp(&stored, previous, Utc::now());

        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| Error::Storage(format!("serialize {}: {}", stored.id, e)))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &path).await?;

        log::info!("Saved document {} to {}", stored.id, path.display());
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for(id)?;
        let _guard = self.locks.acquire(id).await;

        let result = match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        };
        result
    }

    async fn list(&self) -> Result<Vec<DocumentSummary>> {
        let mut summaries = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.read(&path, id).await {
                Ok(doc) => summaries.push(doc.summary()),
                Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
            }
        }
        sort_by_recency(&mut summaries);
        Ok(summaries)
    }
}
