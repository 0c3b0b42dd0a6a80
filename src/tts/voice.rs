use serde::{Deserialize, Serialize};

/// Voices the front-end can pick from.
pub const CATALOGUE: &[&str] = &["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

/// Per-speaker voice selection as sent by the client.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_name: Option<String>,
    pub voice: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceInfo {
    pub id: String,
    pub name: String,
}

pub fn is_known(voice: &str) -> bool {
    CATALOGUE.contains(&voice)
}

pub fn list() -> Vec<VoiceInfo> {
    CATALOGUE
        .iter()
        .map(|id| VoiceInfo {
            id: id.to_string(),
            name: display_name(id),
        })
        .collect()
}

fn display_name(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => id.to_string(),
    }
}
