//! Firestore and Firebase Auth clients for the task dashboard
//!
//! Talks to the public REST APIs:
//! - Firestore documents under `users/{uid}/tasks`
//! - Identity Toolkit email/password sign-in

mod auth;
mod document;
mod store;

pub use auth::FirebaseAuth;
pub use document::{Document, FieldValue, ListDocumentsResponse};
pub use store::FirestoreTaskStore;

use reqwest::Client;
use std::time::Duration;
use taskdash_core::Error;

/// Limit for one HTTP request, from connect to the last body byte
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Map a transport failure into the core error type
pub(crate) fn http_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}
