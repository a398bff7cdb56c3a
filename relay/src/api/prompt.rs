//! Prompt endpoint: dispatch to a backend and stream the output back.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use prompt_relay_common::PromptRequest;

use crate::dispatch::{self, BackendRequest};
use crate::error::{Error, Result};
use crate::state::AppState;

/// Build the prompt router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api", post(submit_prompt))
}

/// POST /api - Run a prompt and stream the generated text.
///
/// Any failure before the first byte is sent is logged and mapped to an
/// error response here, once.
async fn submit_prompt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match relay_prompt(&state, &headers, &body).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Prompt request failed");
            e.into_response()
        }
    }
}

async fn relay_prompt(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<Response> {
    // Parsed by hand so malformed bodies take the same error path as
    // everything else instead of axum's extractor rejection.
    let request: PromptRequest =
        serde_json::from_slice(body).map_err(|e| Error::InvalidRequest(e.to_string()))?;

    let token = dispatch::resolve_credential(state.config.replicate.process_token(), &request)?;
    let client_ip = dispatch::client_ip(headers)?;

    let backend_request = BackendRequest::from_prompt(request)?;
    tracing::info!(
        client_ip = %client_ip,
        modality = %backend_request.modality(),
        backend = %backend_request.backend_name(),
        "Dispatching prompt"
    );

    let prediction = state
        .backend
        .create_prediction(&token, &backend_request.into_prediction())
        .await
        .map_err(Error::BackendSubmission)?;
    tracing::debug!(
        prediction_id = %prediction.id,
        status = ?prediction.status,
        "Prediction created"
    );

    let tokens = state
        .backend
        .stream_output(&prediction)
        .await
        .map_err(Error::StreamRelay)?;

    Ok((
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(tokens.into_body_stream()),
    )
        .into_response())
}
