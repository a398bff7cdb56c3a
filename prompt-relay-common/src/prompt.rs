//! Inbound prompt payload.

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::Modality;

/// Prompt submitted by a caller to `POST /api`.
///
/// Field names are camelCase on the wire. Only `prompt` is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRequest {
    pub prompt: String,
    /// Token limit, forwarded to the backend as given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Backend model reference, used for text prompts only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Image URL; its presence routes the prompt to the vision backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Audio URL; its presence routes the prompt to the audio backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    /// Fallback API token, used when the server has none configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicate_api_token: Option<String>,
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Non-empty image reference, if any.
    pub fn image_ref(&self) -> Option<&str> {
        non_empty(&self.image)
    }

    /// Non-empty audio reference, if any.
    pub fn audio_ref(&self) -> Option<&str> {
        non_empty(&self.audio)
    }

    /// Non-empty model reference, if any.
    pub fn model_ref(&self) -> Option<&str> {
        non_empty(&self.model)
    }

    /// Non-empty body token, if any.
    pub fn api_token(&self) -> Option<&str> {
        non_empty(&self.replicate_api_token)
    }

    /// Modality by precedence: image, then audio, then text.
    pub fn modality(&self) -> Modality {
        if self.image_ref().is_some() {
            Modality::Vision
        } else if self.audio_ref().is_some() {
            Modality::Audio
        } else {
            Modality::Text
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_minimal() {
        let request: PromptRequest = serde_json::from_str(r#"{"prompt": "hi"}"#).unwrap();
        assert_eq!(request.prompt, "hi");
        assert!(request.max_tokens.is_none());
        assert!(request.model.is_none());
        assert_eq!(request.modality(), Modality::Text);
    }

    #[test]
    fn test_request_camel_case_fields() {
        let json = r#"{
            "prompt": "describe this",
            "maxTokens": 50,
            "temperature": 0.7,
            "topP": 0.9,
            "model": "meta/llama-2-70b-chat",
            "replicateApiToken": "r8_abc"
        }"#;

        let request: PromptRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.max_tokens, Some(Number::from(50)));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.top_p, Some(0.9));
        assert_eq!(request.model_ref(), Some("meta/llama-2-70b-chat"));
        assert_eq!(request.api_token(), Some("r8_abc"));
    }

    #[test]
    fn test_max_tokens_accepts_any_number() {
        let request: PromptRequest =
            serde_json::from_str(r#"{"prompt": "hi", "maxTokens": 512.5}"#).unwrap();
        assert_eq!(request.max_tokens.unwrap().as_f64(), Some(512.5));

        let request: PromptRequest =
            serde_json::from_str(r#"{"prompt": "hi", "maxTokens": -1}"#).unwrap();
        assert_eq!(request.max_tokens.unwrap().as_i64(), Some(-1));
    }

    #[test]
    fn test_missing_prompt_is_rejected() {
        let result: Result<PromptRequest, _> = serde_json::from_str(r#"{"maxTokens": 5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_image_takes_precedence_over_audio() {
        let request = PromptRequest {
            image: Some("http://x/y.png".to_string()),
            audio: Some("http://x/y.wav".to_string()),
            ..PromptRequest::new("hi")
        };
        assert_eq!(request.modality(), Modality::Vision);
    }

    #[test]
    fn test_audio_without_image() {
        let request = PromptRequest {
            audio: Some("http://x/y.wav".to_string()),
            ..PromptRequest::new("hi")
        };
        assert_eq!(request.modality(), Modality::Audio);
    }

    #[test]
    fn test_empty_strings_count_as_absent() {
        let request = PromptRequest {
            image: Some(String::new()),
            audio: Some(String::new()),
            replicate_api_token: Some(String::new()),
            ..PromptRequest::new("hi")
        };
        assert_eq!(request.modality(), Modality::Text);
        assert!(request.api_token().is_none());
    }
}
