//! List controller
//!
//! Holds the in-memory snapshot of the signed-in user's tasks and the
//! add/edit state of the input field. Every mutation goes to the store
//! first and is followed by a full [`ListController::reconcile`]; the
//! local list is never patched optimistically.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::session::Session;
use crate::summary::Summary;
use crate::task::{normalize_text, Task, TaskPatch, TaskRepository};
use crate::{Error, Result};

/// How long one store call may run before it is abandoned
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// What the task list area shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Empty,
    Populated,
}

/// Result of a user action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The action reached the store (or changed local edit state)
    Applied,
    /// Nothing to do: blank input, unknown task, or no user attached
    Ignored,
    /// The store call failed; the failure was logged
    Failed,
    /// Another action is still in flight
    Busy,
}

pub struct ListController {
    store: Arc<dyn TaskRepository>,
    timeout: Duration,
    session: Option<Session>,
    tasks: Vec<Task>,
    loading: bool,
    edit_cursor: Option<String>,
    input: String,
}

impl ListController {
    pub fn new(store: Arc<dyn TaskRepository>) -> Self {
        Self {
            store,
            timeout: DEFAULT_STORE_TIMEOUT,
            session: None,
            tasks: Vec::new(),
            loading: true,
            edit_cursor: None,
            input: String::new(),
        }
    }

    /// Bound every store call by `timeout`. A call that runs longer fails
    /// with [`Error::Timeout`] and releases the controller.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn edit_cursor(&self) -> Option<&str> {
        self.edit_cursor.as_deref()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn view(&self) -> ViewState {
        if self.loading {
            ViewState::Loading
        } else if self.tasks.is_empty() {
            ViewState::Empty
        } else {
            ViewState::Populated
        }
    }

    pub fn summary(&self) -> Summary {
        Summary::of(&self.tasks)
    }

    /// Attach a signed-in user and load their tasks
    pub async fn load(&mut self, session: Session) -> Outcome {
        let switched = self
            .session
            .as_ref()
            .map_or(true, |current| current.user_id != session.user_id);
        if switched {
            self.tasks.clear();
            self.edit_cursor = None;
            self.input.clear();
        }
        info!(user_id = %session.user_id, "Loading tasks");
        self.session = Some(session);
        self.reconcile().await
    }

    /// Forget the user and every piece of local state
    pub fn detach(&mut self) {
        if let Some(session) = self.session.take() {
            info!(user_id = %session.user_id, "Session ended, clearing tasks");
        }
        self.tasks.clear();
        self.loading = true;
        self.edit_cursor = None;
        self.input.clear();
    }

    /// Replace the local list with a fresh read of the user's collection.
    ///
    /// On failure the previous list is kept.
    pub async fn reconcile(&mut self) -> Outcome {
        let Some(user_id) = self.user_id() else {
            debug!("Reconcile without a session, ignoring");
            return Outcome::Ignored;
        };

        self.loading = true;
        let result = within(self.timeout, "list", self.store.list(&user_id)).await;
        let outcome = match result {
            Ok(tasks) => {
                debug!(count = tasks.len(), "Fetched tasks");
                self.tasks = tasks;
                Outcome::Applied
            }
            Err(e) => {
                warn!("Error fetching tasks: {}", e);
                Outcome::Failed
            }
        };
        self.loading = false;
        outcome
    }

    /// Create a task from the input, or update the task under the edit
    /// cursor. Blank input is a no-op.
    pub async fn submit(&mut self) -> Outcome {
        let Some(user_id) = self.user_id() else {
            debug!("Submit without a session, ignoring");
            return Outcome::Ignored;
        };
        let Some(text) = normalize_text(&self.input).map(str::to_string) else {
            debug!("Blank input, nothing to submit");
            return Outcome::Ignored;
        };

        let result = match self.edit_cursor.clone() {
            Some(id) => {
                let result = within(
                    self.timeout,
                    "update",
                    self.store.update(&user_id, &id, TaskPatch::text(&text)),
                )
                .await;
                if result.is_ok() {
                    info!(task_id = %id, "Updated task text");
                    self.edit_cursor = None;
                }
                result
            }
            None => within(self.timeout, "create", self.store.create(&user_id, &text))
                .await
                .map(|task| {
                    info!(task_id = %task.id, "Created task");
                }),
        };

        match result {
            Ok(()) => {
                self.input.clear();
                self.reconcile().await;
                Outcome::Applied
            }
            Err(e) => {
                warn!("Error saving task: {}", e);
                Outcome::Failed
            }
        }
    }

    /// Put the task into edit mode. Does not contact the store.
    pub fn edit(&mut self, id: &str) -> Outcome {
        let Some(task) = self.find(id) else {
            debug!(task_id = %id, "Edit of unknown task, ignoring");
            return Outcome::Ignored;
        };
        let (text, task_id) = (task.text.clone(), task.id.clone());
        self.input = text;
        self.edit_cursor = Some(task_id);
        Outcome::Applied
    }

    /// Leave edit mode and clear the input
    pub fn cancel_edit(&mut self) -> Outcome {
        if self.edit_cursor.take().is_none() {
            return Outcome::Ignored;
        }
        self.input.clear();
        Outcome::Applied
    }

    /// Flip the completion flag of a task, based on the local snapshot
    pub async fn toggle(&mut self, id: &str) -> Outcome {
        let Some(user_id) = self.user_id() else {
            return Outcome::Ignored;
        };
        let Some(completed) = self.find(id).map(|t| t.completed) else {
            debug!(task_id = %id, "Toggle of unknown task, ignoring");
            return Outcome::Ignored;
        };

        let result = within(
            self.timeout,
            "update",
            self.store.update(&user_id, id, TaskPatch::completed(!completed)),
        )
        .await;
        match result {
            Ok(()) => {
                info!(task_id = %id, completed = !completed, "Toggled task");
                self.reconcile().await;
                Outcome::Applied
            }
            Err(e) => {
                warn!("Error updating task: {}", e);
                Outcome::Failed
            }
        }
    }

    /// Delete a task. Clears the edit cursor when it points at the task.
    pub async fn delete(&mut self, id: &str) -> Outcome {
        let Some(user_id) = self.user_id() else {
            return Outcome::Ignored;
        };

        let result = within(self.timeout, "delete", self.store.delete(&user_id, id)).await;
        match result {
            Ok(()) => {
                info!(task_id = %id, "Deleted task");
                if self.edit_cursor.as_deref() == Some(id) {
                    self.edit_cursor = None;
                    self.input.clear();
                }
                self.reconcile().await;
                Outcome::Applied
            }
            Err(e) => {
                warn!("Error deleting task: {}", e);
                Outcome::Failed
            }
        }
    }

    fn user_id(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.user_id.clone())
    }

    fn find(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

async fn within<T>(
    timeout: Duration,
    call: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .unwrap_or_else(|_| Err(Error::Timeout(format!("{} after {:?}", call, timeout))))
}
