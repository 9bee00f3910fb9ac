//! Ordered extraction rules for provider responses.
//!
//! Providers put the same piece of information under different keys depending
//! on the endpoint version. Each lookup is an ordered list of [`FieldPath`]s;
//! the first path that resolves to a non-empty string wins.

use serde_json::Value;

use crate::types::{JobStatus, Locator, StatusReport};

/// A sequence of object keys leading to a string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath(pub &'static [&'static str]);

impl FieldPath {
    pub fn resolve<'v>(&self, value: &'v Value) -> Option<&'v str> {
        self.0
            .iter()
            .try_fold(value, |node, key| node.get(key))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Returns the first non-empty string matched by `rules`, in order.
pub fn first_match(value: &Value, rules: &[FieldPath]) -> Option<String> {
    rules
        .iter()
        .find_map(|rule| rule.resolve(value))
        .map(str::to_string)
}

pub const HEYGEN_JOB_ID: &[FieldPath] = &[
    FieldPath(&["data", "video_id"]),
    FieldPath(&["video_id"]),
    FieldPath(&["id"]),
];

pub const STABILITY_GENERATION_ID: &[FieldPath] = &[
    FieldPath(&["id"]),
    FieldPath(&["generation_id"]),
    FieldPath(&["result", "id"]),
];

pub const STATUS_LABEL: &[FieldPath] = &[FieldPath(&["data", "status"]), FieldPath(&["status"])];

pub const DOWNLOAD_URL: &[FieldPath] = &[
    FieldPath(&["data", "video_url"]),
    FieldPath(&["data", "url"]),
    FieldPath(&["data", "download_url"]),
    FieldPath(&["video_url"]),
    FieldPath(&["url"]),
    FieldPath(&["download_url"]),
];

const COMPLETED_LABELS: &[&str] = &["completed", "succeeded", "success", "done"];
const FAILED_LABELS: &[&str] = &["failed", "error"];

/// Maps a provider status label onto [`JobStatus`]. Missing or unknown labels
/// count as in progress.
pub fn normalize_status(label: Option<&str>) -> JobStatus {
    let Some(label) = label else {
        return JobStatus::InProgress;
    };
    let label = label.trim().to_lowercase();
    if COMPLETED_LABELS.contains(&label.as_str()) {
        JobStatus::Completed
    } else if FAILED_LABELS.contains(&label.as_str()) {
        JobStatus::Failed
    } else {
        JobStatus::InProgress
    }
}

/// Builds a [`StatusReport`] from a JSON status body.
pub fn status_report(body: Value) -> StatusReport {
    let label = first_match(&body, STATUS_LABEL);
    let status = normalize_status(label.as_deref());
    let locator = match status {
        JobStatus::Completed => first_match(&body, DOWNLOAD_URL).map(Locator::Url),
        _ => None,
    };
    StatusReport {
        status,
        locator,
        body,
    }
}
