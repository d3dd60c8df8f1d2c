//! Integration tests for debounced autosave. Time is paused so the debounce
//! windows run instantly and deterministically.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::time::sleep;

use folio::autosave::{AutosaveOptions, AutosaveScheduler, AutosaveState};
use folio::error::{Error, Result};
use folio::store::{DocumentStore, MemoryStore};
use folio::{Document, DocumentSummary};

/// Wraps a [`MemoryStore`], recording the title of every save.
#[derive(Default)]
struct RecordingStore {
    inner: MemoryStore,
    titles: Mutex<Vec<String>>,
    gate: Option<Semaphore>,
    offline: bool,
}

impl RecordingStore {
    fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Default::default()
        }
    }

    fn offline() -> Self {
        Self {
            offline: true,
            ..Default::default()
        }
    }

    fn saves(&self) -> Vec<String> {
        self.titles.lock().unwrap().clone()
    }

    fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn load(&self, id: &str) -> Result<Document> {
        self.inner.load(id).await
    }

    async fn save(&self, doc: &Document) -> Result<Document> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if self.offline {
            return Err(Error::Storage("store offline".into()));
        }
        self.titles.lock().unwrap().push(doc.title.clone());
        self.inner.save(doc).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.inner.delete(id).await
    }

    async fn list(&self) -> Result<Vec<DocumentSummary>> {
        self.inner.list().await
    }
}

fn scheduler(store: &Arc<RecordingStore>) -> AutosaveScheduler {
    AutosaveScheduler::new(store.clone(), AutosaveOptions::default())
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_changes_saves_once() {
    let store = Arc::new(RecordingStore::default());
    let autosave = scheduler(&store);

    let mut doc = Document::new("Draft");
    for i in 0..5 {
        doc.set_title(format!("Draft {}", i));
        autosave.document_changed(doc.clone());
        sleep(Duration::from_millis(200)).await;
    }
    // 200ms already elapsed since the last change.
    sleep(Duration::from_millis(2700)).await;
    assert!(store.saves().is_empty());
    assert!(matches!(autosave.state(), AutosaveState::Pending { .. }));

    sleep(Duration::from_millis(200)).await;
    assert_eq!(store.saves(), vec!["Draft 4"]);
    assert!(matches!(autosave.state(), AutosaveState::Fired { .. }));
    assert!(autosave.last_saved().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_custom_delay() {
    let store = Arc::new(RecordingStore::default());
    let autosave = AutosaveScheduler::new(
        store.clone(),
        AutosaveOptions::new().with_delay(Duration::from_millis(500)),
    );

    autosave.document_changed(Document::new("Quick"));
    sleep(Duration::from_millis(450)).await;
    assert!(store.saves().is_empty());
    sleep(Duration::from_millis(100)).await;
    assert_eq!(store.saves(), vec!["Quick"]);
}

#[tokio::test(start_paused = true)]
async fn test_autosave_failure_is_recorded_not_raised() {
    let store = Arc::new(RecordingStore::offline());
    let autosave = scheduler(&store);

    autosave.document_changed(Document::new("Doomed"));
    sleep(Duration::from_millis(3100)).await;

    assert!(autosave.last_saved().is_none());
    let message = autosave.last_error().unwrap();
    assert!(message.contains("store offline"));

    let explicit = autosave.save_now(&Document::new("Doomed")).await;
    assert!(matches!(explicit, Err(Error::Storage(_))));
    assert!(!autosave.is_busy());
}

#[tokio::test(start_paused = true)]
async fn test_save_now_keeps_pending_autosave() {
    let store = Arc::new(RecordingStore::default());
    let autosave = scheduler(&store);

    autosave.document_changed(Document::new("Pending"));
    let saved = autosave.save_now(&Document::new("Explicit")).await.unwrap();
    assert_eq!(autosave.assigned_id(), Some(saved.id.clone()));
    assert!(matches!(autosave.state(), AutosaveState::Pending { .. }));

    sleep(Duration::from_millis(3100)).await;
    assert_eq!(store.saves(), vec!["Explicit", "Pending"]);
    // The autosave reused the id assigned by the explicit save.
    assert_eq!(store.inner.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_change_during_in_flight_save() {
    let store = Arc::new(RecordingStore::gated());
    let autosave = scheduler(&store);

    autosave.document_changed(Document::new("First"));
    sleep(Duration::from_millis(3100)).await;
    assert!(matches!(autosave.state(), AutosaveState::Fired { .. }));
    assert!(store.saves().is_empty());

    // The fired save is blocked in the store; a new change must not abort it.
    autosave.document_changed(Document::new("Second"));
    store.release(2);
    sleep(Duration::from_millis(10)).await;
    assert_eq!(store.saves(), vec!["First"]);

    sleep(Duration::from_millis(3100)).await;
    assert_eq!(store.saves(), vec!["First", "Second"]);
}

#[tokio::test(start_paused = true)]
async fn test_drop_cancels_pending_save() {
    let store = Arc::new(RecordingStore::default());
    {
        let autosave = scheduler(&store);
        autosave.document_changed(Document::new("Abandoned"));
    }
    sleep(Duration::from_secs(10)).await;
    assert!(store.saves().is_empty());
}
