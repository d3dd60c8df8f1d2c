//! In-memory document store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::{sort_by_recency, stamp, DocumentStore, IdLocks};
use crate::error::{Error, Result};
use crate::model::{Document, DocumentSummary};

/// Keeps documents in a map. Contents are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, Document>>,
    locks: IdLocks,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.read().is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, id: &str) -> Result<Document> {
        self.docs
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn save(&self, doc: &Document) -> Result<Document> {
        let id = if doc.id.is_empty() {
            super::new_id()
        } else {
            doc.id.clone()
        };
        let _guard = self.locks.acquire(&id).await;

        let previous = self.docs.read().get(&id).and_then(|d| d.created_at);
        let mut stored = doc.clone();
        stored.id = id.clone();
        let stored = stamp(&stored, previous, Utc::now());
        self.docs.write().insert(id, stored.clone());
        log::info!("Saved document {} ({:?})", stored.id, stored.title);
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let _guard = self.locks.acquire(id).await;

        let removed = self.docs.write().remove(id);
        match removed {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(id.to_string())),
        }
    }

    async fn list(&self) -> Result<Vec<DocumentSummary>> {
        let mut summaries: Vec<DocumentSummary> =
            self.docs.read().values().map(Document::summary).collect();
        sort_by_recency(&mut summaries);
        Ok(summaries)
    }
}
