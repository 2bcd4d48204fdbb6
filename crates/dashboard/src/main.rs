//! Terminal front end for the task dashboard
//!
//! Reads commands from stdin and renders the dashboard after each one.
//! Logs go to stderr; set `RUST_LOG` to change the filter.

mod render;
mod shell;

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskdash_core::auth::{AuthService, LocalAuth};
use taskdash_core::config::{Backend, Config};
use taskdash_core::controller::ListController;
use taskdash_core::dashboard::Dashboard;
use taskdash_core::navigation::LogNavigator;
use taskdash_core::task::{FileTaskStore, InMemoryTaskStore, TaskRepository};
use taskdash_firestore::{FirebaseAuth, FirestoreTaskStore};

use crate::shell::Login;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "taskdash=info,taskdash_core=info,taskdash_firestore=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env().context("Failed to read configuration")?;
    tracing::info!("Using backend: {:?}", config.backend);

    let (store, login): (Arc<dyn TaskRepository>, Login) = match &config.backend {
        Backend::Memory => (
            Arc::new(InMemoryTaskStore::new()) as Arc<dyn TaskRepository>,
            Login::Local(Arc::new(LocalAuth::new())),
        ),
        Backend::File { path } => {
            let store = FileTaskStore::new(path.clone())
                .await
                .with_context(|| format!("Failed to open task file {}", path.display()))?;
            (
                Arc::new(store) as Arc<dyn TaskRepository>,
                Login::Local(Arc::new(LocalAuth::new())),
            )
        }
        Backend::Firestore(firestore) => {
            let auth = Arc::new(
                FirebaseAuth::new(&firestore.identity_url, firestore.api_key.clone())
                    .with_timeout(config.request_timeout),
            );
            let store = FirestoreTaskStore::new(
                &firestore.firestore_url,
                &firestore.project_id,
                auth.sessions(),
            )
            .with_timeout(config.request_timeout);
            (Arc::new(store) as Arc<dyn TaskRepository>, Login::Firebase(auth))
        }
    };

    let navigator = Arc::new(LogNavigator::new(config.landing_route.clone()));
    let controller = ListController::new(store).with_timeout(config.request_timeout);
    let dashboard = Dashboard::with_controller(controller, login.service(), navigator);

    shell::run(&dashboard, &login).await?;

    dashboard.shutdown();
    Ok(())
}
