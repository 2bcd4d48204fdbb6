//! Outbound navigation signal

/// Receives the "go to the landing route" signal raised on missing
/// sessions and explicit logout.
pub trait Navigator: Send + Sync {
    fn to_landing(&self);
}

/// Navigator that only logs the redirect
pub struct LogNavigator {
    route: String,
}

impl LogNavigator {
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
        }
    }
}

impl Navigator for LogNavigator {
    fn to_landing(&self) {
        tracing::info!("Navigating to {}", self.route);
    }
}
