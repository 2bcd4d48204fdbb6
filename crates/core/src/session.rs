//! Authenticated session

use chrono::{DateTime, Utc};
use std::fmt;

/// An authenticated user context
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub signed_in_at: DateTime<Utc>,
    /// Bearer token for remote stores, when the auth service issues one
    pub id_token: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        let email = email.into();
        Self {
            user_id: user_id.into(),
            display_name: display_name_from(&email).to_string(),
            email,
            signed_in_at: Utc::now(),
            id_token: None,
        }
    }

    pub fn with_id_token(mut self, token: impl Into<String>) -> Self {
        self.id_token = Some(token.into());
        self
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("signed_in_at", &self.signed_in_at)
            .field("id_token", &self.id_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// The part of an account identifier before the first `@`.
pub fn display_name_from(account: &str) -> &str {
    account.split('@').next().unwrap_or(account)
}
