//! Prediction backend abstraction.
//!
//! This module defines the `PredictionBackend` trait that hides the hosted
//! inference API behind two calls: submit a prediction, then open its output
//! stream. `ReplicateClient` is the HTTP implementation.

mod client;
mod sse;
mod stream;

pub use client::ReplicateClient;
pub use sse::{SseDecoder, SseEvent};
pub use stream::TokenStream;

use async_trait::async_trait;
use prompt_relay_common::{Prediction, PredictionRequest};

/// Errors talking to the prediction API.
#[derive(Debug, thiserror::Error)]
pub enum ReplicateError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// Non-success answer from the API. The message is the API's own
    /// explanation, passed through unchanged.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Prediction {0} does not support streaming")]
    NotStreamable(String),

    #[error("Prediction stream failed: {0}")]
    Stream(String),
}

pub type Result<T> = std::result::Result<T, ReplicateError>;

/// API credential for one request.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

/// A service that runs predictions and streams their output.
#[async_trait]
pub trait PredictionBackend: Send + Sync {
    /// Unique identifier for this backend type (e.g., "replicate").
    fn backend_type(&self) -> &'static str;

    /// Submit a prediction. Returns as soon as the prediction is accepted,
    /// not when it completes.
    async fn create_prediction(
        &self,
        token: &ApiToken,
        request: &PredictionRequest,
    ) -> Result<Prediction>;

    /// Open the output stream of a running prediction.
    async fn stream_output(&self, prediction: &Prediction) -> Result<TokenStream>;
}
