//! Firestore REST document encoding
//!
//! Firestore wraps every field in a typed value object, e.g.
//! `{"text": {"stringValue": "Buy milk"}, "completed": {"booleanValue": false}}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use taskdash_core::task::{Task, TaskPatch};

/// A typed Firestore value. Only the kinds used by task documents are
/// modelled; anything else decodes as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean_value: Option<bool>,
}

impl FieldValue {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            string_value: Some(value.into()),
            boolean_value: None,
        }
    }

    pub fn boolean(value: bool) -> Self {
        Self {
            string_value: None,
            boolean_value: Some(value),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name, `projects/.../documents/users/{uid}/tasks/{id}`.
    /// Absent on write requests.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl Document {
    /// Body for creating a new pending task
    pub fn new_task(text: &str) -> Self {
        Self::from_patch(&TaskPatch {
            text: Some(text.to_string()),
            completed: Some(false),
        })
    }

    /// Body carrying only the fields set in `patch`
    pub fn from_patch(patch: &TaskPatch) -> Self {
        let mut fields = BTreeMap::new();
        if let Some(text) = &patch.text {
            fields.insert("text".to_string(), FieldValue::string(text));
        }
        if let Some(completed) = patch.completed {
            fields.insert("completed".to_string(), FieldValue::boolean(completed));
        }
        Self {
            name: String::new(),
            fields,
        }
    }

    /// Last path segment of the resource name
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    pub fn into_task(self) -> Task {
        let text = self
            .fields
            .get("text")
            .and_then(|v| v.string_value.clone())
            .unwrap_or_default();
        let completed = self
            .fields
            .get("completed")
            .and_then(|v| v.boolean_value)
            .unwrap_or(false);
        Task {
            id: self.id().to_string(),
            text,
            completed,
        }
    }
}

/// Names of the fields present in `patch`, for `updateMask.fieldPaths`
pub(crate) fn field_mask(patch: &TaskPatch) -> Vec<&'static str> {
    let mut mask = Vec::new();
    if patch.text.is_some() {
        mask.push("text");
    }
    if patch.completed.is_some() {
        mask.push("completed");
    }
    mask
}
