use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};

use super::{BackendError, SpeechBackend};
use crate::jobs::JobId;
use crate::script::Script;

const SAMPLE_RATE: u32 = 22050;
const SECONDS_PER_WORD: f32 = 0.4;
const SEGMENT_GAP_SECS: f32 = 0.25;
const MAX_AUDIO_SECS: f32 = 30.0;

/// Placeholder backend: waits out fixed delays, renders silence of a plausible
/// length and "uploads" it to a URL under `audio_base_url`.
pub struct SimulatedBackend {
    generate_delay: Duration,
    upload_delay: Duration,
    audio_base_url: String,
}

impl SimulatedBackend {
    pub fn new(generate_delay: Duration, upload_delay: Duration, audio_base_url: String) -> Self {
        Self {
            generate_delay,
            upload_delay,
            audio_base_url: audio_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SpeechBackend for SimulatedBackend {
    async fn generate(&self, job_id: &JobId, script: &Script) -> Result<Vec<u8>, BackendError> {
        tokio::time::sleep(self.generate_delay).await;

        let seconds = estimated_seconds(script);
        let samples = vec![0.0f32; (seconds * SAMPLE_RATE as f32) as usize];

        let wav = tokio::task::spawn_blocking(move || samples_to_wav(&samples, SAMPLE_RATE))
            .await
            .map_err(|e| BackendError::Synthesis(format!("WAV encoder crashed: {}", e)))??;

        let voices: Vec<String> = script
            .segments
            .iter()
            .map(|s| match &s.speaker {
                Some(speaker) => format!("{}={}", speaker, s.voice),
                None => s.voice.clone(),
            })
            .collect();

        tracing::debug!(
            job_id = %job_id,
            model = ?script.model,
            ?voices,
            bytes = wav.len(),
            "Rendered placeholder audio"
        );

        Ok(wav)
    }

    async fn upload(&self, job_id: &JobId, audio: Vec<u8>) -> Result<String, BackendError> {
        tokio::time::sleep(self.upload_delay).await;

        if audio.is_empty() {
            return Err(BackendError::Upload("no audio to upload".into()));
        }

        Ok(format!("{}/{}.wav", self.audio_base_url, job_id))
    }
}

fn estimated_seconds(script: &Script) -> f32 {
    let speech = script.word_count() as f32 * SECONDS_PER_WORD;
    let gaps = script.segments.len().saturating_sub(1) as f32 * SEGMENT_GAP_SECS;
    (speech + gaps).min(MAX_AUDIO_SECS)
}

/// Convert audio samples to WAV format
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, BackendError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut buffer = Vec::new();
    {
        let cursor = Cursor::new(&mut buffer);
        let mut writer = WavWriter::new(cursor, spec)
            .map_err(|e| BackendError::Synthesis(format!("Failed to create WAV writer: {}", e)))?;

        for sample in samples {
            let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(scaled)
                .map_err(|e| BackendError::Synthesis(format!("Failed to write sample: {}", e)))?;
        }

        writer
            .finalize()
            .map_err(|e| BackendError::Synthesis(format!("Failed to finalize WAV: {}", e)))?;
    }

    Ok(buffer)
}
