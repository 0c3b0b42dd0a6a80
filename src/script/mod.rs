pub mod parser;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::tts::voice::{self, VoiceConfig};
use crate::tts::Model;
use parser::Line;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Single,
    Multi,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ScriptError {
    #[error("Text cannot be empty")]
    EmptyText,

    #[error("At least one voice must be configured")]
    NoVoices,

    #[error("Unknown voice '{0}'")]
    UnknownVoice(String),
}

impl From<ScriptError> for AppError {
    fn from(err: ScriptError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// One stretch of speech rendered with a single voice.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub speaker: Option<String>,
    pub voice: String,
    pub text: String,
}

/// A validated synthesis request, ready for the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub model: Model,
    pub segments: Vec<Segment>,
}

impl Script {
    pub fn compile(
        model: Model,
        mode: Mode,
        text: &str,
        voices: &[VoiceConfig],
    ) -> Result<Self, ScriptError> {
        if text.trim().is_empty() {
            return Err(ScriptError::EmptyText);
        }

        let Some(first) = voices.first() else {
            return Err(ScriptError::NoVoices);
        };

        if let Some(unknown) = voices.iter().find(|v| !voice::is_known(&v.voice)) {
            return Err(ScriptError::UnknownVoice(unknown.voice.clone()));
        }

        let segments = match mode {
            // Extra entries left over from a multi-speaker form are ignored.
            Mode::Single => vec![Segment {
                speaker: speaker_name(first).map(str::to_string),
                voice: first.voice.clone(),
                text: text.trim().to_string(),
            }],
            Mode::Multi => dialogue_segments(text, voices)?,
        };

        Ok(Self { model, segments })
    }

    pub fn word_count(&self) -> usize {
        self.segments
            .iter()
            .map(|s| s.text.split_whitespace().count())
            .sum()
    }
}

fn speaker_name(config: &VoiceConfig) -> Option<&str> {
    config
        .speaker_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
}

/// Split multi-speaker text into segments.
///
/// The first entry with a given name owns it; blank names never match a
/// prefix. Text before the first speaker line is spoken by the first entry.
fn dialogue_segments(text: &str, voices: &[VoiceConfig]) -> Result<Vec<Segment>, ScriptError> {
    let mut names: Vec<&str> = Vec::with_capacity(voices.len());
    for name in voices.iter().filter_map(speaker_name) {
        if !names.contains(&name) {
            names.push(name);
        }
    }

    let mut segments: Vec<Segment> = Vec::new();
    for line in parser::parse(text, &names) {
        match line {
            Line::Blank => {}
            Line::Speaker { name, text } => {
                let voice = voices
                    .iter()
                    .find(|v| speaker_name(v) == Some(name.as_str()))
                    .map(|v| v.voice.clone())
                    .unwrap_or_default();
                segments.push(Segment {
                    speaker: Some(name),
                    voice,
                    text,
                });
            }
            Line::Text(more) => match segments.last_mut() {
                Some(current) => {
                    if !current.text.is_empty() {
                        current.text.push(' ');
                    }
                    current.text.push_str(&more);
                }
                None => segments.push(Segment {
                    speaker: speaker_name(&voices[0]).map(str::to_string),
                    voice: voices[0].voice.clone(),
                    text: more,
                }),
            },
        }
    }

    segments.retain(|s| !s.text.is_empty());
    if segments.is_empty() {
        return Err(ScriptError::EmptyText);
    }

    Ok(segments)
}
