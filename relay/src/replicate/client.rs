//! HTTP client for the Replicate prediction API.

use async_trait::async_trait;
use futures_util::StreamExt;
use prompt_relay_common::{Prediction, PredictionInput, PredictionRequest, PredictionTarget};
use reqwest::header::{ACCEPT, CACHE_CONTROL, USER_AGENT};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};

use super::{ApiToken, PredictionBackend, ReplicateError, Result, TokenStream};

/// Replicate prediction client.
///
/// Submits predictions on behalf of the caller's token and opens their
/// event streams. One instance is shared by all requests.
pub struct ReplicateClient {
    http_client: Client,
    base_url: String,
    user_agent: String,
}

impl ReplicateClient {
    pub fn new(base_url: &str, user_agent: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    /// Version targets go to the generic endpoint, model targets to the
    /// model-scoped one.
    ///
    /// Each path segment is percent-encoded, so a model reference can never
    /// leave the `models/` prefix.
    fn predictions_url(&self, target: &PredictionTarget) -> Result<Url> {
        let invalid_base = || ReplicateError::Request(format!("invalid base URL: {}", self.base_url));

        let mut url = Url::parse(&self.base_url).map_err(|_| invalid_base())?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| invalid_base())?;
            segments.pop_if_empty();
            if let PredictionTarget::Model(model) = target {
                segments.push("models").extend(model.split('/'));
            }
            segments.push("predictions");
        }
        Ok(url)
    }
}

// ============================================================================
// Replicate API types
// ============================================================================

/// Body of a create-prediction call. A model target lives in the URL path,
/// so only a version is ever part of the body.
#[derive(Debug, Serialize)]
struct CreatePredictionBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    input: &'a PredictionInput,
    stream: bool,
}

impl<'a> From<&'a PredictionRequest> for CreatePredictionBody<'a> {
    fn from(request: &'a PredictionRequest) -> Self {
        let version = match &request.target {
            PredictionTarget::Version(version) => Some(version.as_str()),
            PredictionTarget::Model(_) => None,
        };
        Self {
            version,
            input: &request.input,
            stream: request.stream,
        }
    }
}

/// Problem-details style error body.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Turn a non-success response into an error carrying the API's message.
async fn api_error(response: Response) -> ReplicateError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.detail.or(parsed.title))
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| format!("Replicate returned {}", status));

    ReplicateError::Api {
        status: status.as_u16(),
        message,
    }
}

// ============================================================================
// PredictionBackend implementation
// ============================================================================

#[async_trait]
impl PredictionBackend for ReplicateClient {
    fn backend_type(&self) -> &'static str {
        "replicate"
    }

    async fn create_prediction(
        &self,
        token: &ApiToken,
        request: &PredictionRequest,
    ) -> Result<Prediction> {
        let url = self.predictions_url(&request.target)?;
        let body = CreatePredictionBody::from(request);

        tracing::debug!("Submitting prediction to {}", url);

        let response = self
            .http_client
            .post(url)
            .bearer_auth(token.expose())
            .header(USER_AGENT, &self.user_agent)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReplicateError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ReplicateError::InvalidResponse(e.to_string()))
    }

    async fn stream_output(&self, prediction: &Prediction) -> Result<TokenStream> {
        let url = prediction
            .urls
            .stream
            .as_deref()
            .ok_or_else(|| ReplicateError::NotStreamable(prediction.id.clone()))?;

        tracing::debug!(prediction_id = %prediction.id, "Opening prediction stream {}", url);

        let response = self
            .http_client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-store")
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| ReplicateError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ReplicateError::Stream(e.to_string())));

        Ok(TokenStream::new(prediction.id.clone(), bytes))
    }
}
