//! Task model definitions

use serde::{Deserialize, Serialize};

/// A to-do item in a user's task collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Document id assigned by the store
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    /// Create a pending task with the given id and text
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            completed: false,
        }
    }

    /// Mark the task as completed
    pub fn completed(mut self) -> Self {
        self.completed = true;
        self
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(text) = &patch.text {
            self.text = text.clone();
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }
}

/// Partial update of a task document. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Patch that only replaces the text
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            completed: None,
        }
    }

    /// Patch that only sets the completion flag
    pub fn completed(completed: bool) -> Self {
        Self {
            text: None,
            completed: Some(completed),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.completed.is_none()
    }
}

/// Returns the trimmed text, or `None` when nothing but whitespace is left.
pub fn normalize_text(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
