//! Error types for the relay server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::replicate::ReplicateError;

/// Error types for prompt handling.
///
/// Every variant answers with HTTP 500. The credential and caller-identity
/// guards keep their own bodies; everything else collapses into one generic
/// `{error, details}` body, so callers never see which layer failed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Server error: Missing API Token")]
    MissingCredential,

    #[error("IP address could not be retrieved")]
    MissingClientIdentity,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    BackendSubmission(ReplicateError),

    #[error(transparent)]
    StreamRelay(ReplicateError),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;

        match self {
            Error::MissingCredential => {
                (status, Json(json!({ "error": self.to_string() }))).into_response()
            }
            Error::MissingClientIdentity => (status, self.to_string()).into_response(),
            Error::InvalidRequest(_) | Error::BackendSubmission(_) | Error::StreamRelay(_) => {
                let body = Json(json!({
                    "error": "Internal Server Error",
                    "details": self.to_string()
                }));
                (status, body).into_response()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
