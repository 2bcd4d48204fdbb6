//! Auth service boundary
//!
//! The dashboard never signs users in itself. It subscribes to a session
//! stream and can ask the service to sign out.

use async_trait::async_trait;
use tokio::sync::watch;

use crate::session::Session;
use crate::{Error, Result};

/// External authentication service
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Subscribe to session changes. The receiver holds the current session
    /// immediately; dropping it unsubscribes.
    fn sessions(&self) -> watch::Receiver<Option<Session>>;

    /// End the current session, if any
    async fn sign_out(&self) -> Result<()>;
}

/// Credential-free auth for local use and tests
pub struct LocalAuth {
    tx: watch::Sender<Option<Session>>,
}

impl Default for LocalAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalAuth {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Sign in as the given account. The user id is stable per email so a
    /// persisted store finds the same collection again.
    pub fn sign_in(&self, email: &str) -> Result<Session> {
        let email = email.trim();
        if email.is_empty() {
            return Err(Error::InvalidInput("Email cannot be empty".to_string()));
        }
        let session = Session::new(format!("local-{}", email.to_lowercase()), email);
        tracing::info!(user_id = %session.user_id, "Signed in locally");
        self.tx.send_replace(Some(session.clone()));
        Ok(session)
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }
}

#[async_trait]
impl AuthService for LocalAuth {
    fn sessions(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }

    async fn sign_out(&self) -> Result<()> {
        self.tx.send_replace(None);
        Ok(())
    }
}
