//! HTTP API.

pub mod health;
pub mod prompt;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Build the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(prompt::router())
        .merge(health::router())
}
