pub mod simulated;
pub mod voice;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::jobs::JobId;
use crate::script::Script;

pub use simulated::SimulatedBackend;
pub use voice::{VoiceConfig, VoiceInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Model {
    #[serde(rename = "Gemini 2.5 Flash")]
    Flash,
    #[serde(rename = "Gemini 2.5 Pro")]
    Pro,
}

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("synthesis failed: {0}")]
    Synthesis(String),

    #[error("upload failed: {0}")]
    Upload(String),
}

/// The two pieces of real work behind a job: rendering audio and publishing it.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    async fn generate(&self, job_id: &JobId, script: &Script) -> Result<Vec<u8>, BackendError>;

    /// Store the rendered audio and return the location clients fetch it from.
    async fn upload(&self, job_id: &JobId, audio: Vec<u8>) -> Result<String, BackendError>;
}
