//! Input modalities and the fixed backend deployments serving them.

use serde::{Deserialize, Serialize};

/// A pinned backend deployment: a human-readable model name plus the exact
/// version id predictions are submitted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBackend {
    pub name: &'static str,
    pub version: &'static str,
}

/// Vision-language backend used for image prompts.
pub const LLAVA_13B: FixedBackend = FixedBackend {
    name: "yorickvp/llava-13b",
    version: "e272157381e2a3bf12df3a8edd1f38d1dbd736bbb7437277c8b34175f8fce358",
};

/// Audio-language backend used for audio prompts.
pub const SALMONN: FixedBackend = FixedBackend {
    name: "nateraw/salmonn",
    version: "ad1d3f9d2bd683628242b68d890bef7f7bd97f738a7c2ccbf1743a594c723d83",
};

/// The kind of content that decides which backend serves a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// Plain text prompt, served by a caller-chosen model
    Text,
    /// Prompt with an attached image
    Vision,
    /// Prompt with an attached audio clip
    Audio,
}

impl Modality {
    /// All modality variants for iteration.
    pub const ALL: [Modality; 3] = [Modality::Text, Modality::Vision, Modality::Audio];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Vision => "vision",
            Modality::Audio => "audio",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_ids_are_full_length() {
        for backend in [LLAVA_13B, SALMONN] {
            assert_eq!(backend.version.len(), 64);
            assert!(backend.version.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn test_display_matches_serde() {
        for modality in Modality::ALL {
            let json = serde_json::to_string(&modality).unwrap();
            assert_eq!(json, format!("\"{}\"", modality));
        }
    }
}
