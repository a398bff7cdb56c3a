//! Prediction payloads for the hosted inference API.
//!
//! A prediction is one inference run against a backend. It is created by
//! submitting a [`PredictionRequest`]; the API answers with a [`Prediction`]
//! handle whose `urls.stream` endpoint emits the output as server-sent events
//! while the run is in progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// What a prediction runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionTarget {
    /// A model by `owner/name`, resolved to its latest version by the API.
    Model(String),
    /// An exact version id.
    Version(String),
}

/// Normalized prediction submission, independent of how it is sent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRequest {
    #[serde(flatten)]
    pub target: PredictionTarget,
    pub stream: bool,
    pub input: PredictionInput,
}

impl PredictionRequest {
    /// A streaming prediction against `target`.
    pub fn streaming(target: PredictionTarget, input: impl Into<PredictionInput>) -> Self {
        Self {
            target,
            stream: true,
            input: input.into(),
        }
    }
}

/// Backend-specific input mapping.
///
/// Each backend names its parameters differently, so each gets its own
/// struct; the enum serializes as the bare inner object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionInput {
    Text(TextInput),
    Vision(VisionInput),
    Audio(AudioInput),
}

/// Input for text language models.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextInput {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub repetition_penalty: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

/// Input for the vision-language backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisionInput {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<Number>,
    pub image: String,
}

/// Input for the audio-language backend.
///
/// This backend calls its token limit `max_length` and its audio reference
/// `wav_path`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioInput {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<Number>,
    pub wav_path: String,
}

impl From<TextInput> for PredictionInput {
    fn from(input: TextInput) -> Self {
        Self::Text(input)
    }
}

impl From<VisionInput> for PredictionInput {
    fn from(input: VisionInput) -> Self {
        Self::Vision(input)
    }
}

impl From<AudioInput> for PredictionInput {
    fn from(input: AudioInput) -> Self {
        Self::Audio(input)
    }
}

/// Lifecycle state of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

/// Endpoints attached to a prediction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionUrls {
    #[serde(default)]
    pub get: Option<String>,
    #[serde(default)]
    pub cancel: Option<String>,
    /// Server-sent events endpoint, present when the prediction was created
    /// with `stream: true` and the backend supports it.
    #[serde(default)]
    pub stream: Option<String>,
}

/// Prediction handle returned on submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    pub status: PredictionStatus,
    #[serde(default)]
    pub urls: PredictionUrls,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
