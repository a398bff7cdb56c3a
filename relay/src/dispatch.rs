//! Prompt dispatch: credential and caller resolution, backend selection,
//! and construction of the prediction submitted for a prompt.

use axum::http::HeaderMap;
use prompt_relay_common::{
    AudioInput, FixedBackend, Modality, PredictionRequest, PredictionTarget, PromptRequest,
    TextInput, VisionInput, LLAVA_13B, SALMONN,
};

use crate::error::{Error, Result};
use crate::replicate::ApiToken;

/// Repetition penalty sent to text models. 1 disables the penalty.
const REPETITION_PENALTY: u32 = 1;

/// Pick the API token for a request: the process-wide token wins, the token
/// in the request body is the fallback.
pub fn resolve_credential(configured: Option<String>, request: &PromptRequest) -> Result<ApiToken> {
    configured
        .filter(|token| !token.is_empty())
        .or_else(|| request.api_token().map(str::to_string))
        .map(ApiToken::new)
        .ok_or(Error::MissingCredential)
}

/// Caller address from `x-real-ip`, else the first `x-forwarded-for` hop.
pub fn client_ip(headers: &HeaderMap) -> Result<String> {
    if let Some(ip) = header_str(headers, "x-real-ip") {
        return Ok(ip.to_string());
    }

    header_str(headers, "x-forwarded-for")
        .and_then(|list| list.split(',').map(str::trim).find(|hop| !hop.is_empty()))
        .map(str::to_string)
        .ok_or(Error::MissingClientIdentity)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// A text model reference: `owner/name`, optionally pinned as
/// `owner/name:version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef {
    pub name: String,
    pub version: Option<String>,
}

impl ModelRef {
    /// Parse and validate a caller-supplied reference.
    ///
    /// Owner and name end up as URL path segments, so both are limited to
    /// ASCII alphanumerics, `-`, `_` and `.`, and may not be `.` or `..`.
    pub fn parse(model: &str) -> Result<Self> {
        let (name, version) = match model.split_once(':') {
            Some((name, version)) => (name, Some(version)),
            None => (model, None),
        };

        let valid_name = matches!(
            name.split_once('/'),
            Some((owner, model_name)) if is_path_segment(owner) && is_path_segment(model_name)
        );
        let valid_version = version.map_or(true, |version| {
            !version.is_empty() && version.chars().all(|c| c.is_ascii_alphanumeric())
        });
        if !valid_name || !valid_version {
            return Err(Error::InvalidRequest(format!(
                "invalid model reference '{}', expected owner/name or owner/name:version",
                model
            )));
        }

        Ok(Self {
            name: name.to_string(),
            version: version.map(str::to_string),
        })
    }

    pub fn target(&self) -> PredictionTarget {
        match &self.version {
            Some(version) => PredictionTarget::Version(version.clone()),
            None => PredictionTarget::Model(self.name.clone()),
        }
    }
}

fn is_path_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl std::fmt::Display for ModelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A prompt resolved to exactly one backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendRequest {
    Text { model: ModelRef, input: TextInput },
    Vision { backend: FixedBackend, input: VisionInput },
    Audio { backend: FixedBackend, input: AudioInput },
}

impl BackendRequest {
    /// Select the backend for a prompt and map its fields onto that
    /// backend's input names.
    ///
    /// Precedence is image, then audio, then text. Only text prompts need a
    /// model; image and audio prompts ignore it.
    pub fn from_prompt(request: PromptRequest) -> Result<Self> {
        let modality = request.modality();
        let PromptRequest {
            prompt,
            max_tokens,
            temperature,
            top_p,
            model,
            image,
            audio,
            ..
        } = request;

        match modality {
            Modality::Vision => Ok(Self::Vision {
                backend: LLAVA_13B,
                input: VisionInput {
                    prompt,
                    top_p,
                    temperature,
                    max_tokens,
                    image: image.unwrap_or_default(),
                },
            }),
            Modality::Audio => Ok(Self::Audio {
                backend: SALMONN,
                input: AudioInput {
                    prompt,
                    top_p,
                    temperature,
                    max_length: max_tokens,
                    wav_path: audio.unwrap_or_default(),
                },
            }),
            Modality::Text => {
                let model = model
                    .as_deref()
                    .filter(|model| !model.is_empty())
                    .ok_or_else(|| {
                        Error::InvalidRequest("model is required for text prompts".to_string())
                    })?;

                Ok(Self::Text {
                    model: ModelRef::parse(model)?,
                    input: TextInput {
                        prompt,
                        max_tokens,
                        temperature,
                        repetition_penalty: REPETITION_PENALTY,
                        top_p,
                    },
                })
            }
        }
    }

    pub fn modality(&self) -> Modality {
        match self {
            Self::Text { .. } => Modality::Text,
            Self::Vision { .. } => Modality::Vision,
            Self::Audio { .. } => Modality::Audio,
        }
    }

    /// Human-readable name of the backend serving this request.
    pub fn backend_name(&self) -> String {
        match self {
            Self::Text { model, .. } => model.to_string(),
            Self::Vision { backend, .. } | Self::Audio { backend, .. } => backend.name.to_string(),
        }
    }

    /// The streaming prediction to submit.
    pub fn into_prediction(self) -> PredictionRequest {
        match self {
            Self::Text { model, input } => PredictionRequest::streaming(model.target(), input),
            Self::Vision { backend, input } => PredictionRequest::streaming(pinned(backend), input),
            Self::Audio { backend, input } => PredictionRequest::streaming(pinned(backend), input),
        }
    }
}

fn pinned(backend: FixedBackend) -> PredictionTarget {
    PredictionTarget::Version(backend.version.to_string())
}
