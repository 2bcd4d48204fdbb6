//! Test doubles for the store and navigation boundaries

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};

use crate::navigation::Navigator;
use crate::task::{InMemoryTaskStore, Task, TaskPatch, TaskRepository};
use crate::{Error, Result};

/// A call observed by [`RecordingStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List(String),
    Create(String, String),
    Update(String, String, TaskPatch),
    Delete(String, String),
}

/// In-memory store that records every call and can be told to fail or
/// to hold the next call until released.
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryTaskStore,
    calls: Mutex<Vec<StoreCall>>,
    failing: AtomicBool,
    hold: Mutex<Option<oneshot::Receiver<()>>>,
    entered: Arc<Notify>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(user_id: &str, tasks: Vec<Task>) -> Self {
        Self {
            inner: InMemoryTaskStore::with_tasks(user_id, tasks),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    /// Make every subsequent call fail with a storage error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Park the next call until the returned sender fires or is dropped
    pub fn hold_next(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        if let Ok(mut hold) = self.hold.lock() {
            *hold = Some(rx);
        }
        tx
    }

    /// Notified whenever a held call has started waiting
    pub fn entered(&self) -> Arc<Notify> {
        Arc::clone(&self.entered)
    }

    async fn record(&self, call: StoreCall) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        let held = self.hold.lock().ok().and_then(|mut h| h.take());
        if let Some(rx) = held {
            self.entered.notify_one();
            let _ = rx.await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Storage("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for RecordingStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Task>> {
        self.record(StoreCall::List(user_id.to_string())).await?;
        self.inner.list(user_id).await
    }

    async fn create(&self, user_id: &str, text: &str) -> Result<Task> {
        self.record(StoreCall::Create(user_id.to_string(), text.to_string()))
            .await?;
        self.inner.create(user_id, text).await
    }

    async fn update(&self, user_id: &str, id: &str, patch: TaskPatch) -> Result<()> {
        self.record(StoreCall::Update(
            user_id.to_string(),
            id.to_string(),
            patch.clone(),
        ))
        .await?;
        self.inner.update(user_id, id, patch).await
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        self.record(StoreCall::Delete(user_id.to_string(), id.to_string()))
            .await?;
        self.inner.delete(user_id, id).await
    }
}

/// Navigator that counts redirects
#[derive(Default)]
pub struct RecordingNavigator {
    redirects: AtomicUsize,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn to_landing(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}
