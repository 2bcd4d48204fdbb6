//! In-memory task storage
//!
//! Keeps each user's collection as a vector in insertion order. Used for
//! tests and for running the dashboard without any backing service.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{normalize_text, Task, TaskPatch};
use super::repository::TaskRepository;
use crate::{Error, Result};

/// Per-user task collections held in memory
#[derive(Default)]
pub struct InMemoryTaskStore {
    collections: RwLock<HashMap<String, Vec<Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one user's tasks
    pub fn with_tasks(user_id: impl Into<String>, tasks: Vec<Task>) -> Self {
        let mut collections = HashMap::new();
        collections.insert(user_id.into(), tasks);
        Self {
            collections: RwLock::new(collections),
        }
    }
}

/// Apply `patch` to the task with `id` inside `tasks`.
pub(crate) fn patch_in_place(tasks: &mut [Task], id: &str, patch: &TaskPatch) -> Result<()> {
    if let Some(text) = &patch.text {
        if normalize_text(text).is_none() {
            return Err(Error::InvalidInput("Task text cannot be empty".to_string()));
        }
    }
    let task = tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
    task.apply(patch);
    Ok(())
}

/// Build a new pending task with a fresh id.
pub(crate) fn new_task(text: &str) -> Result<Task> {
    let text = normalize_text(text)
        .ok_or_else(|| Error::InvalidInput("Task text cannot be empty".to_string()))?;
    Ok(Task::new(Uuid::new_v4().simple().to_string(), text))
}

#[async_trait]
impl TaskRepository for InMemoryTaskStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Task>> {
        let collections = self.collections.read().await;
        Ok(collections.get(user_id).cloned().unwrap_or_default())
    }

    async fn create(&self, user_id: &str, text: &str) -> Result<Task> {
        let task = new_task(text)?;
        let mut collections = self.collections.write().await;
        collections
            .entry(user_id.to_string())
            .or_default()
            .push(task.clone());
        Ok(task)
    }

    async fn update(&self, user_id: &str, id: &str, patch: TaskPatch) -> Result<()> {
        let mut collections = self.collections.write().await;
        let tasks = collections
            .get_mut(user_id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        patch_in_place(tasks, id, &patch)
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(tasks) = collections.get_mut(user_id) {
            tasks.retain(|t| t.id != id);
        }
        Ok(())
    }
}
