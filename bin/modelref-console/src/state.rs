//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use modelref_client::ReferenceApi;

use crate::config::Config;
use crate::snapshot::SnapshotStore;

/// State shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Console configuration (env-derived).
    pub config: Arc<Config>,
    /// The model reference service.
    pub api: Arc<dyn ReferenceApi>,
    /// Fetched audit views.
    pub snapshots: Arc<SnapshotStore>,
}

impl AppState {
    pub fn new(config: Config, api: Arc<dyn ReferenceApi>) -> Self {
        Self {
            config: Arc::new(config),
            snapshots: Arc::new(SnapshotStore::new(Arc::clone(&api))),
            api,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("snapshots", &self.snapshots)
            .finish_non_exhaustive()
    }
}
