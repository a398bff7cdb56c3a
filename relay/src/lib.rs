//! prompt-relay - routes text, image and audio prompts to hosted generative
//! models and streams their output back to the caller.

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod replicate;
pub mod state;
pub mod test_util;

pub use config::Config;
pub use error::{Error, Result};
pub use replicate::{ApiToken, PredictionBackend, ReplicateClient, ReplicateError, TokenStream};
pub use state::AppState;

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router with its middleware stack.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(api::router())
        .layer(middleware::from_fn(logging::request_logger))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
