//! Debounced autosave.
//!
//! Every edit restarts a single timer. The document is saved only after the
//! timer runs out with no newer edit, so a burst of changes produces one
//! write.
//!
//! ```no_run
//! use std::sync::Arc;
//! use folio::autosave::{AutosaveOptions, AutosaveScheduler};
//! use folio::store::MemoryStore;
//! use folio::Document;
//!
//! # async fn run() {
//! let scheduler = AutosaveScheduler::new(Arc::new(MemoryStore::new()), AutosaveOptions::default());
//! let mut doc = Document::new("Draft");
//! scheduler.document_changed(doc.clone());
//! doc.set_title("Draft 2");
//! scheduler.document_changed(doc);
//! # }
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::Result;
use crate::model::Document;
use crate::store::DocumentStore;

/// Autosave configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveOptions {
    /// Idle time after the last change before saving
    pub delay: Duration,
}

impl Default for AutosaveOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(3),
        }
    }
}

impl AutosaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debounce delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Timer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveState {
    /// No save scheduled
    Idle,
    /// A save will start at `deadline` unless another change arrives
    Pending { deadline: Instant },
    /// The last scheduled save started at `at`
    Fired { at: Instant },
}

struct Slot {
    state: AutosaveState,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

struct Inner {
    store: Arc<dyn DocumentStore>,
    slot: Mutex<Slot>,
    save_lock: tokio::sync::Mutex<()>,
    assigned_id: Mutex<Option<String>>,
    last_saved: Mutex<Option<DateTime<Utc>>>,
    last_error: Mutex<Option<String>>,
    busy: AtomicUsize,
}

impl Inner {
    async fn persist(&self, doc: &Document) -> Result<Document> {
        let _serial = self.save_lock.lock().await;

        let mut doc = doc.clone();
        if doc.id.is_empty() {
            let assigned = self.assigned_id.lock().clone();
            if let Some(id) = assigned {
                doc.id = id;
            }
        }

        match self.store.save(&doc).await {
            Ok(saved) => {
                if doc.id.is_empty() {
                    *self.assigned_id.lock() = Some(saved.id.clone());
                }
                *self.last_saved.lock() = Some(saved.updated_at.unwrap_or_else(Utc::now));
                *self.last_error.lock() = None;
                Ok(saved)
            }
            Err(e) => {
                *self.last_error.lock() = Some(e.to_string());
                Err(e)
            }
        }
    }
}

struct BusyGuard<'a>(&'a AtomicUsize);

impl<'a> BusyGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Debounces document changes into saves against a [`DocumentStore`].
///
/// Must be used inside a tokio runtime. Dropping the scheduler cancels a
/// pending save; a save that already started runs to completion.
pub struct AutosaveScheduler {
    inner: Arc<Inner>,
    options: AutosaveOptions,
}

impl AutosaveScheduler {
    /// Create a scheduler saving to `store`.
    pub fn new(store: Arc<dyn DocumentStore>, options: AutosaveOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                slot: Mutex::new(Slot {
                    state: AutosaveState::Idle,
                    generation: 0,
                    handle: None,
                }),
                save_lock: tokio::sync::Mutex::new(()),
                assigned_id: Mutex::new(None),
                last_saved: Mutex::new(None),
                last_error: Mutex::new(None),
                busy: AtomicUsize::new(0),
            }),
            options,
        }
    }

    /// The configured options.
    pub fn options(&self) -> &AutosaveOptions {
        &self.options
    }

    /// Record a change; replaces any pending save with one for `doc`.
    pub fn document_changed(&self, doc: Document) {
        let mut slot = self.inner.slot.lock();
        abort_pending(&mut slot);

        slot.generation += 1;
        let generation = slot.generation;
        let deadline = Instant::now() + self.options.delay;
        slot.state = AutosaveState::Pending { deadline };

        let inner = Arc::clone(&self.inner);
        slot.handle = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            {
                let mut slot = inner.slot.lock();
                if slot.generation != generation {
                    return;
                }
                slot.state = AutosaveState::Fired { at: Instant::now() };
            }
            log::debug!("Autosaving {:?}", doc.title);
            if let Err(e) = inner.persist(&doc).await {
                log::warn!("Autosave of {:?} failed: {}", doc.title, e);
            }
        }));
    }

    /// Save immediately, reporting failures to the caller.
    ///
    /// A pending autosave stays scheduled.
    pub async fn save_now(&self, doc: &Document) -> Result<Document> {
        let _busy = BusyGuard::enter(&self.inner.busy);
        self.inner.persist(doc).await
    }

    /// Drop the pending save, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let mut slot = self.inner.slot.lock();
        let was_pending = matches!(slot.state, AutosaveState::Pending { .. });
        if was_pending {
            abort_pending(&mut slot);
            slot.generation += 1;
            slot.state = AutosaveState::Idle;
        }
        was_pending
    }

    /// Current timer state.
    pub fn state(&self) -> AutosaveState {
        self.inner.slot.lock().state
    }

    /// Time of the last successful save.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_saved.lock()
    }

    /// Message of the last failed save, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        self.inner.last_error.lock().clone()
    }

    /// Whether an explicit save is in progress.
    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::SeqCst) > 0
    }

    /// Id assigned by the store to a document first saved without one.
    pub fn assigned_id(&self) -> Option<String> {
        self.inner.assigned_id.lock().clone()
    }
}

impl Drop for AutosaveScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Abort the timer task if it has not fired. A fired task is left running.
fn abort_pending(slot: &mut Slot) {
    let handle = slot.handle.take();
    if let (AutosaveState::Pending { .. }, Some(handle)) = (slot.state, handle) {
        handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn scheduler() -> (AutosaveScheduler, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let scheduler = AutosaveScheduler::new(store.clone(), AutosaveOptions::default());
        (scheduler, store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_schedules_save() {
        let (scheduler, store) = scheduler();
        assert_eq!(scheduler.state(), AutosaveState::Idle);

        scheduler.document_changed(Document::new("Draft"));
        assert!(matches!(scheduler.state(), AutosaveState::Pending { .. }));

        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert!(matches!(scheduler.state(), AutosaveState::Fired { .. }));
        assert_eq!(store.len(), 1);
        assert!(scheduler.last_saved().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending() {
        let (scheduler, store) = scheduler();
        scheduler.document_changed(Document::new("Draft"));
        assert!(scheduler.cancel());
        assert!(!scheduler.cancel());
        assert_eq!(scheduler.state(), AutosaveState::Idle);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_assigned_id_reused() {
        let (scheduler, store) = scheduler();
        let saved = scheduler.save_now(&Document::new("Draft")).await.unwrap();
        assert_eq!(scheduler.assigned_id(), Some(saved.id.clone()));

        let again = scheduler.save_now(&Document::new("Draft v2")).await.unwrap();
        assert_eq!(again.id, saved.id);
        assert_eq!(store.len(), 1);
        assert!(!scheduler.is_busy());
    }
}
