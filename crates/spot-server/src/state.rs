use std::sync::Arc;

use spot_registry::GarageRegistry;
use tokio::sync::watch;

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub registry: Arc<GarageRegistry>,
    shutdown: watch::Sender<bool>,
}

impl AppState {
    pub fn new(registry: Arc<GarageRegistry>, shutdown: watch::Sender<bool>) -> Self {
        Self { registry, shutdown }
    }

    /// Ask the server to stop. Safe to call more than once.
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }
}
