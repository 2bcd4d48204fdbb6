//! Firestore-backed task repository

use async_trait::async_trait;
use std::time::Duration;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tokio::sync::watch;
use tracing::debug;

use taskdash_core::session::Session;
use taskdash_core::task::{normalize_text, Task, TaskPatch, TaskRepository};
use taskdash_core::{Error, Result};

use crate::document::{field_mask, Document, ListDocumentsResponse};
use crate::{http_client, http_error, DEFAULT_REQUEST_TIMEOUT};

const PAGE_SIZE: usize = 300;

/// Task repository over the Firestore REST API.
///
/// Requests carry the id token of the current session as a bearer token.
pub struct FirestoreTaskStore {
    client: Client,
    /// `{base}/v1/projects/{project}/databases/(default)/documents`
    documents_url: String,
    sessions: watch::Receiver<Option<Session>>,
}

impl FirestoreTaskStore {
    pub fn new(
        base_url: &str,
        project_id: &str,
        sessions: watch::Receiver<Option<Session>>,
    ) -> Self {
        Self {
            client: http_client(DEFAULT_REQUEST_TIMEOUT),
            documents_url: format!(
                "{}/v1/projects/{}/databases/(default)/documents",
                base_url.trim_end_matches('/'),
                urlencoding::encode(project_id)
            ),
            sessions,
        }
    }

    /// Use a preconfigured HTTP client (proxy, timeouts)
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Replace the default per-request timeout
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_client(http_client(timeout))
    }

    fn collection_url(&self, user_id: &str) -> String {
        format!(
            "{}/users/{}/tasks",
            self.documents_url,
            urlencoding::encode(user_id)
        )
    }

    fn document_url(&self, user_id: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(user_id), urlencoding::encode(id))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .sessions
            .borrow()
            .as_ref()
            .and_then(|s| s.id_token.clone());
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.authorize(request).send().await.map_err(http_error)
    }
}

/// Turn a non-success response into an error
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = format!("Firestore returned {}: {}", status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Unauthenticated(message)),
        _ => Err(Error::Storage(message)),
    }
}

#[async_trait]
impl TaskRepository for FirestoreTaskStore {
    async fn list(&self, user_id: &str) -> Result<Vec<Task>> {
        let url = self.collection_url(user_id);
        let mut tasks = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .query(&[("pageSize", PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = check(self.send(request).await?).await?;
            let page: ListDocumentsResponse = response.json().await.map_err(http_error)?;
            tasks.extend(page.documents.into_iter().map(Document::into_task));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(user_id, count = tasks.len(), "Listed Firestore tasks");
        Ok(tasks)
    }

    async fn create(&self, user_id: &str, text: &str) -> Result<Task> {
        let text = normalize_text(text)
            .ok_or_else(|| Error::InvalidInput("Task text cannot be empty".to_string()))?;
        let request = self
            .client
            .post(self.collection_url(user_id))
            .json(&Document::new_task(text));

        let response = check(self.send(request).await?).await?;
        let created: Document = response.json().await.map_err(http_error)?;
        Ok(created.into_task())
    }

    async fn update(&self, user_id: &str, id: &str, patch: TaskPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let mut query: Vec<(&str, &str)> = field_mask(&patch)
            .into_iter()
            .map(|field| ("updateMask.fieldPaths", field))
            .collect();
        query.push(("currentDocument.exists", "true"));

        let request = self
            .client
            .patch(self.document_url(user_id, id))
            .query(&query)
            .json(&Document::from_patch(&patch));

        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::TaskNotFound(id.to_string()));
        }
        check(response).await.map(|_| ())
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        let request = self.client.delete(self.document_url(user_id, id));
        check(self.send(request).await?).await.map(|_| ())
    }
}
