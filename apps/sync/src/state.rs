use std::sync::Arc;

use crate::config::Config;
use crate::sync::SyncOrchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Same instance the scheduler drives, so its run lock covers both triggers.
    pub orchestrator: Arc<SyncOrchestrator>,
}
