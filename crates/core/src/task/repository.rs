//! Task repository trait
//!
//! Defines the interface for per-user task storage. Every operation is
//! scoped to the `users/{user_id}/tasks` collection of one account.

use async_trait::async_trait;

use super::model::{Task, TaskPatch};
use crate::Result;

/// Repository interface for a user's task collection
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Read every task in the user's collection, in store order
    async fn list(&self, user_id: &str) -> Result<Vec<Task>>;

    /// Append a new pending task with the given text
    async fn create(&self, user_id: &str, text: &str) -> Result<Task>;

    /// Apply a partial update to one task
    async fn update(&self, user_id: &str, id: &str, patch: TaskPatch) -> Result<()>;

    /// Remove one task
    async fn delete(&self, user_id: &str, id: &str) -> Result<()>;
}
