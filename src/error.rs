use std::time::Duration;

/// Longest slice of a response body carried inside an error message.
pub(crate) const BODY_SNIPPET_LEN: usize = 500;

/// Cuts a response body down to [`BODY_SNIPPET_LEN`] characters for diagnostics.
pub(crate) fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(BODY_SNIPPET_LEN) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Errors returned by the `mediagen` clients and poller.
#[derive(Debug, thiserror::Error)]
pub enum MediaGenError {
    /// No API key could be resolved for the provider.
    #[error("Missing {provider} API key. {hint}")]
    MissingApiKey {
        provider: &'static str,
        hint: &'static str,
    },
    /// The API key cannot be sent as an HTTP header value.
    #[error("API key contains characters that cannot be sent in an HTTP header")]
    InvalidApiKey,
    /// Error from the underlying HTTP client.
    #[error("Network request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// Error parsing a JSON response.
    #[error("Failed to parse API response: {0}")]
    ResponseParseFailed(#[from] serde_json::Error),
    /// Error building a request URL.
    #[error("URL parsing failed: {0}")]
    UrlParseFailed(#[from] url::ParseError),
    /// Error reading an input image or writing an artifact.
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// The image artifact was not valid base64.
    #[error("Invalid base64 artifact: {0}")]
    Base64Failed(#[from] base64::DecodeError),
    /// Text-to-image returned a non-200 status.
    #[error("Image generation failed: {status} {body}")]
    ImageGenerationFailed { status: u16, body: String },
    /// A submit endpoint rejected the job.
    #[error("Job submission failed: {status} {body}")]
    SubmitFailed { status: u16, body: String },
    /// A success response did not contain the expected fields.
    #[error("Unexpected response shape: {body}")]
    UnrecognizedResponse { body: String },
    /// Every known endpoint variant was missing or declined the request.
    #[error("No endpoint variant accepted the request: {last_error}")]
    EndpointsExhausted { last_error: String },
    /// A status request returned a non-success status.
    #[error("Status check failed: {status} {body}")]
    StatusCheckFailed { status: u16, body: String },
    /// The provider reported the job as failed. Carries the full status body.
    #[error("Job {job_id} failed: {body}")]
    JobFailed { job_id: String, body: String },
    /// The job completed but its status response had no download locator.
    #[error("Job reported completion but no download URL was found: {body}")]
    MissingDownloadLocator { body: String },
    /// Downloading the finished artifact returned a non-success status.
    #[error("Artifact download failed: {status} {body}")]
    DownloadFailed { status: u16, body: String },
    /// The job was still in progress when the maximum wait elapsed.
    #[error("Timed out after {waited:?} waiting for job {job_id}")]
    Timeout { job_id: String, waited: Duration },
    /// Polling was cancelled through the poller's cancellation token.
    #[error("Polling for job {job_id} was cancelled")]
    Cancelled { job_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_bodies_are_kept_whole() {
        assert_eq!(truncate_body("{\"error\":\"bad\"}"), "{\"error\":\"bad\"}");
    }

    #[test]
    fn long_bodies_are_cut_on_a_char_boundary() {
        let body = "é".repeat(BODY_SNIPPET_LEN + 20);
        let cut = truncate_body(&body);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), BODY_SNIPPET_LEN + 3);
    }
}
