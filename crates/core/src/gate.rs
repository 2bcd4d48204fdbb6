//! Auth gate
//!
//! Observes the session stream and keeps the list controller in step
//! with it: a session loads that user's tasks, no session redirects to
//! the landing route and clears local state.

use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::info;

use crate::controller::ListController;
use crate::navigation::Navigator;
use crate::session::Session;

/// How far the observer has got through the session stream
#[derive(Debug, Clone, Default)]
struct Progress {
    handled: u64,
    /// User of the last handled event, `None` when it was a sign-out
    user_id: Option<String>,
}

/// A running session observer. Dropping it unsubscribes.
pub struct AuthGate {
    handle: JoinHandle<()>,
    progress: watch::Receiver<Progress>,
}

impl AuthGate {
    /// Start observing `sessions`. The current value is handled right away.
    pub fn spawn(
        sessions: watch::Receiver<Option<Session>>,
        controller: Arc<Mutex<ListController>>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (progress_tx, progress) = watch::channel(Progress::default());
        let handle = tokio::spawn(observe(sessions, controller, navigator, progress_tx));
        Self { handle, progress }
    }

    /// Wait until at least `count` session events have been handled
    pub async fn settled(&self, count: u64) {
        let mut progress = self.progress.clone();
        let _ = progress.wait_for(|p| p.handled >= count).await;
    }

    /// Wait until the latest handled event belongs to `user_id`, or was a
    /// sign-out when `user_id` is `None`. Events still being handled for
    /// another user do not count.
    pub async fn settled_on(&self, user_id: Option<&str>) {
        let mut progress = self.progress.clone();
        let _ = progress
            .wait_for(|p| p.handled > 0 && p.user_id.as_deref() == user_id)
            .await;
    }

    /// Number of session events handled so far
    pub fn handled(&self) -> u64 {
        self.progress.borrow().handled
    }

    /// Stop observing session changes
    pub fn teardown(self) {}
}

impl Drop for AuthGate {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn observe(
    mut sessions: watch::Receiver<Option<Session>>,
    controller: Arc<Mutex<ListController>>,
    navigator: Arc<dyn Navigator>,
    progress: watch::Sender<Progress>,
) {
    loop {
        let session = sessions.borrow_and_update().clone();
        let user_id = session.as_ref().map(|s| s.user_id.clone());
        apply_session(session, &controller, navigator.as_ref()).await;
        progress.send_modify(|p| {
            p.handled += 1;
            p.user_id = user_id;
        });

        if sessions.changed().await.is_err() {
            info!("Auth service closed the session stream");
            break;
        }
    }
}

/// Handle one session notification
pub async fn apply_session(
    session: Option<Session>,
    controller: &Mutex<ListController>,
    navigator: &dyn Navigator,
) {
    match session {
        None => {
            navigator.to_landing();
            controller.lock().await.detach();
        }
        Some(session) => {
            info!(user_id = %session.user_id, name = %session.display_name, "Session started");
            controller.lock().await.load(session).await;
        }
    }
}
