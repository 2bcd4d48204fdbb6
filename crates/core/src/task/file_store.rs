//! File-based task storage implementation
//!
//! Stores every user's collection as JSON in a single file on disk,
//! keyed by user id.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

use super::memory_store::{new_task, patch_in_place};
use super::model::{Task, TaskPatch};
use super::repository::TaskRepository;
use crate::{Error, Result};

/// File-based task store using JSON
pub struct FileTaskStore {
    /// Path to the JSON file
    path: PathBuf,
    /// In-memory cache of every user's tasks
    cache: RwLock<BTreeMap<String, Vec<Task>>>,
}

impl FileTaskStore {
    /// Create a new FileTaskStore
    ///
    /// If the file doesn't exist, it will be created on first write.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
        })
    }

    /// Persist the cache to disk
    async fn persist(&self) -> Result<()> {
        let content = {
            let cache = self.cache.read().await;
            serde_json::to_string_pretty(&*cache)?
        };

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", self.path.display(), e)))
    }
}

#[async_trait]
impl TaskRepository for FileTaskStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Task>> {
        let cache = self.cache.read().await;
        Ok(cache.get(user_id).cloned().unwrap_or_default())
    }

    async fn create(&self, user_id: &str, text: &str) -> Result<Task> {
        let task = new_task(text)?;
        {
            let mut cache = self.cache.write().await;
            cache
                .entry(user_id.to_string())
                .or_default()
                .push(task.clone());
        }
        self.persist().await?;
        Ok(task)
    }

    async fn update(&self, user_id: &str, id: &str, patch: TaskPatch) -> Result<()> {
        {
            let mut cache = self.cache.write().await;
            let tasks = cache
                .get_mut(user_id)
                .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
            patch_in_place(tasks, id, &patch)?;
        }
        self.persist().await
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        let removed = {
            let mut cache = self.cache.write().await;
            match cache.get_mut(user_id) {
                Some(tasks) => {
                    let before = tasks.len();
                    tasks.retain(|t| t.id != id);
                    tasks.len() != before
                }
                None => false,
            }
        };
        if removed {
            self.persist().await?;
        }
        Ok(())
    }
}
