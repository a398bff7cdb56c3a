//! prompt-relay Common Types
//!
//! Shared types for the relay server and its callers: the inbound prompt
//! payload, the prediction payloads sent to the hosted backend, and the
//! well-known backend deployments.

pub mod modality;
pub mod prediction;
pub mod prompt;

pub use modality::{FixedBackend, Modality, LLAVA_13B, SALMONN};
pub use prediction::{
    AudioInput, Prediction, PredictionInput, PredictionRequest, PredictionStatus,
    PredictionTarget, PredictionUrls, TextInput, VisionInput,
};
pub use prompt::PromptRequest;
