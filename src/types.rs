use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Opaque job identifier handed out by a submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Normalized lifecycle state of a remote job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Queued, processing, or an unknown label.
    InProgress,
    /// The provider reports the job as done.
    Completed,
    /// The provider reports the job as failed.
    Failed,
}

/// Where the finished artifact can be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A URL fetched with a plain GET.
    Url(String),
    /// The artifact bytes, returned directly by the status endpoint.
    Inline(Bytes),
}

/// One normalized status response.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub status: JobStatus,
    pub locator: Option<Locator>,
    /// The raw response body, kept for diagnostics.
    pub body: serde_json::Value,
}

impl StatusReport {
    pub fn in_progress(body: serde_json::Value) -> Self {
        Self {
            status: JobStatus::InProgress,
            locator: None,
            body,
        }
    }
}

/// Timing of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Pause between two status requests.
    pub interval: Duration,
    /// Longest time spent polling before giving up.
    pub max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(8),
            max_wait: Duration::from_secs(900),
        }
    }
}
