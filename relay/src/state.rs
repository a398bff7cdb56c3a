//! Shared application state.

use std::sync::Arc;

use crate::config::Config;
use crate::replicate::PredictionBackend;

/// Shared application state passed to all handlers.
///
/// Nothing in here changes after startup; requests share it read-only.
pub struct AppState {
    pub config: Config,
    pub backend: Arc<dyn PredictionBackend>,
}

impl AppState {
    pub fn new(config: Config, backend: Arc<dyn PredictionBackend>) -> Self {
        Self { config, backend }
    }
}
