//! Dashboard
//!
//! Ties the auth gate, the list controller and navigation together behind
//! one shared handle. Only one user action runs at a time: an action that
//! arrives while another is still waiting on the store is refused with
//! [`Outcome::Busy`] instead of interleaving with it.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::auth::AuthService;
use crate::controller::{ListController, Outcome, ViewState};
use crate::gate::AuthGate;
use crate::navigation::Navigator;
use crate::summary::Summary;
use crate::task::{Task, TaskRepository};
use crate::Result;

/// Point-in-time copy of everything the view renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub display_name: Option<String>,
    pub tasks: Vec<Task>,
    pub view: ViewState,
    pub edit_cursor: Option<String>,
    pub input: String,
    pub summary: Summary,
}

/// How long [`Dashboard::snapshot`] waits for a running action before it
/// falls back to the last copy
pub const SNAPSHOT_WAIT: Duration = Duration::from_millis(500);

impl Snapshot {
    fn of(controller: &ListController) -> Self {
        Self {
            display_name: controller.session().map(|s| s.display_name.clone()),
            tasks: controller.tasks().to_vec(),
            view: controller.view(),
            edit_cursor: controller.edit_cursor().map(str::to_string),
            input: controller.input().to_string(),
            summary: controller.summary(),
        }
    }

    pub fn signed_in(&self) -> bool {
        self.display_name.is_some()
    }

    /// Task at a 1-based position in the list
    pub fn task_at(&self, position: usize) -> Option<&Task> {
        position.checked_sub(1).and_then(|i| self.tasks.get(i))
    }
}

pub struct Dashboard {
    controller: Arc<Mutex<ListController>>,
    auth: Arc<dyn AuthService>,
    navigator: Arc<dyn Navigator>,
    gate: AuthGate,
    last: watch::Sender<Snapshot>,
}

impl Dashboard {
    /// Build the dashboard and start observing the auth service
    pub fn start(
        store: Arc<dyn TaskRepository>,
        auth: Arc<dyn AuthService>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::with_controller(ListController::new(store), auth, navigator)
    }

    /// Like [`Dashboard::start`], with a controller configured by the caller
    pub fn with_controller(
        controller: ListController,
        auth: Arc<dyn AuthService>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (last, _) = watch::channel(Snapshot::of(&controller));
        let controller = Arc::new(Mutex::new(controller));
        let gate = AuthGate::spawn(
            auth.sessions(),
            Arc::clone(&controller),
            Arc::clone(&navigator),
        );
        Self {
            controller,
            auth,
            navigator,
            gate,
            last,
        }
    }

    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    /// Submit `text` as the input: creates a task, or updates the task
    /// being edited.
    pub async fn submit(&self, text: &str) -> Outcome {
        let Some(mut controller) = self.acquire("submit") else {
            return Outcome::Busy;
        };
        controller.set_input(text);
        let outcome = controller.submit().await;
        self.remember(&controller);
        outcome
    }

    pub async fn edit(&self, id: &str) -> Outcome {
        match self.acquire("edit") {
            Some(mut controller) => {
                let outcome = controller.edit(id);
                self.remember(&controller);
                outcome
            }
            None => Outcome::Busy,
        }
    }

    pub async fn cancel_edit(&self) -> Outcome {
        match self.acquire("cancel") {
            Some(mut controller) => {
                let outcome = controller.cancel_edit();
                self.remember(&controller);
                outcome
            }
            None => Outcome::Busy,
        }
    }

    pub async fn toggle(&self, id: &str) -> Outcome {
        let Some(mut controller) = self.acquire("toggle") else {
            return Outcome::Busy;
        };
        let outcome = controller.toggle(id).await;
        self.remember(&controller);
        outcome
    }

    pub async fn delete(&self, id: &str) -> Outcome {
        let Some(mut controller) = self.acquire("delete") else {
            return Outcome::Busy;
        };
        let outcome = controller.delete(id).await;
        self.remember(&controller);
        outcome
    }

    pub async fn refresh(&self) -> Outcome {
        let Some(mut controller) = self.acquire("refresh") else {
            return Outcome::Busy;
        };
        let outcome = controller.reconcile().await;
        self.remember(&controller);
        outcome
    }

    /// Sign out and go back to the landing route
    pub async fn logout(&self) -> Result<()> {
        info!("Logging out");
        self.auth.sign_out().await?;
        self.navigator.to_landing();
        Ok(())
    }

    /// Wait briefly for any in-flight action, then copy the current state.
    /// If the action is still running after [`SNAPSHOT_WAIT`], the last
    /// copy is returned instead.
    pub async fn snapshot(&self) -> Snapshot {
        match tokio::time::timeout(SNAPSHOT_WAIT, self.controller.lock()).await {
            Ok(controller) => self.remember(&controller),
            Err(_) => {
                debug!("Action still in flight, showing the last snapshot");
                self.last.borrow().clone()
            }
        }
    }

    /// Stop observing the auth service
    pub fn shutdown(self) {
        self.gate.teardown();
    }

    fn remember(&self, controller: &ListController) -> Snapshot {
        let snapshot = Snapshot::of(controller);
        self.last.send_replace(snapshot.clone());
        snapshot
    }

    fn acquire(&self, action: &str) -> Option<MutexGuard<'_, ListController>> {
        let guard = self.controller.try_lock().ok();
        if guard.is_none() {
            debug!(action, "Another action is in flight, refusing");
        }
        guard
    }
}
