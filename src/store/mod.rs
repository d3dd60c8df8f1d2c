//! Document persistence.
//!
//! [`DocumentStore`] is the seam between the engine and wherever documents
//! live. Two implementations ship with the crate: [`MemoryStore`] for tests
//! and embedding, and [`FileStore`], which keeps one JSON file per document.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{Document, DocumentSummary};

/// Storage backend for documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Load a document by id.
    async fn load(&self, id: &str) -> Result<Document>;

    /// Save a document and return the stored version.
    ///
    /// A document with an empty id gets a fresh UUID. `created_at` is set on
    /// the first save only; `updated_at` on every save.
    async fn save(&self, doc: &Document) -> Result<Document>;

    /// Delete a document.
    async fn delete(&self, id: &str) -> Result<()>;

    /// List all documents, most recently updated first.
    async fn list(&self) -> Result<Vec<DocumentSummary>>;
}

/// Per-id async locks so that writes to one document never interleave.
///
/// An entry lives only while someone holds or awaits it; the last
/// [`IdGuard`] to drop removes it.
#[derive(Debug, Default)]
pub(crate) struct IdLocks {
    locks: parking_lot::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl IdLocks {
    /// Wait for exclusive access to `id`.
    pub(crate) async fn acquire(&self, id: &str) -> IdGuard<'_> {
        let lock = Arc::clone(self.locks.lock().entry(id.to_string()).or_default());
        let guard = lock.lock_owned().await;
        IdGuard {
            locks: self,
            id: id.to_string(),
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().len()
    }
}

/// Exclusive access to one id, released on drop.
pub(crate) struct IdGuard<'a> {
    locks: &'a IdLocks,
    id: String,
    guard: Option<tokio::sync::OwnedMutexGuard<()>>,
}

impl Drop for IdGuard<'_> {
    fn drop(&mut self) {
        // Release the mutex first so its Arc no longer counts as a holder.
        drop(self.guard.take());
        let mut locks = self.locks.locks.lock();
        if locks
            .get(&self.id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.id);
        }
    }
}

/// Stamp a document for storage.
///
/// `previous_created` is the creation time already on record, if any.
pub(crate) fn stamp(
    doc: &Document,
    previous_created: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Document {
    let mut stored = doc.clone();
    if stored.id.is_empty() {
        stored.id = new_id();
    }
    stored.created_at = previous_created.or(doc.created_at).or(Some(now));
    stored.updated_at = Some(now);
    stored
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn sort_by_recency(summaries: &mut [DocumentSummary]) {
    summaries.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.title.cmp(&b.title))
    });
}
