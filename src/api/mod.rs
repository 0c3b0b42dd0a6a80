pub mod handlers;
pub mod routes;

use serde::{Deserialize, Serialize};

use crate::jobs::JobId;
use crate::script::Mode;
use crate::tts::{Model, VoiceConfig, VoiceInfo};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRequest {
    pub model: Model,
    pub mode: Mode,
    pub text: String,
    pub voice_config: Vec<VoiceConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub job_id: JobId,
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub voices: Vec<VoiceInfo>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub jobs: usize,
}
