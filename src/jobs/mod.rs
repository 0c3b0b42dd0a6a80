pub mod driver;
pub mod store;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use driver::{JobRunner, StageTimings};
pub use store::JobStore;

/// Opaque job identifier. Generated ids are UUIDv4 strings, but lookups accept
/// any string so unknown ids simply resolve to "not found".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Generating,
    Uploading,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Generating => "generating",
            JobStatus::Uploading => "uploading",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked synthesis request, as reported to polling clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// A single transition applied to a stored job.
///
/// Terminal transitions carry their payload, so a completed job always has an
/// audio URL and a failed job always has an error message.
#[derive(Debug, Clone, PartialEq)]
pub enum JobUpdate {
    Advance(JobStatus),
    Completed { audio_url: String },
    Failed { error: String },
}

impl Job {
    pub fn new() -> Self {
        Self {
            id: JobId::generate(),
            status: JobStatus::Pending,
            audio_url: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    /// Merge `update` into the record. Returns `false` and leaves the job
    /// untouched when the job is already terminal or the update is not a
    /// legal transition.
    pub fn apply(&mut self, update: JobUpdate) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        match update {
            JobUpdate::Advance(status) if status.is_terminal() => false,
            JobUpdate::Advance(status) => {
                self.status = status;
                true
            }
            JobUpdate::Completed { audio_url } => {
                self.status = JobStatus::Completed;
                self.audio_url = Some(audio_url);
                self.error = None;
                true
            }
            JobUpdate::Failed { error } => {
                self.status = JobStatus::Failed;
                self.error = Some(error);
                self.audio_url = None;
                true
            }
        }
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}
