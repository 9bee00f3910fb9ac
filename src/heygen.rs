use crate::client::{
    authenticated_client, parse_base_url, push_segment, status_and_body, ArtifactFetcher,
};
use crate::config::{resolve_api_key, HEYGEN_KEY};
use crate::error::{truncate_body, MediaGenError};
use crate::extract::{first_match, status_report, HEYGEN_JOB_ID};
use crate::payload::{StatusEndpoint, VideoJob};
use crate::poller::{Poller, StatusSource};
use crate::types::{JobId, StatusReport};
use async_trait::async_trait;
use reqwest::header::HeaderName;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_HEYGEN_HOST: &str = "https://api.heygen.com";

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for the HeyGen video generation API.
///
/// Cheap to clone; the underlying `reqwest::Client` is shared.
#[derive(Clone)]
pub struct HeyGenClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HeyGenClient {
    /// Creates a new `HeyGenClient`.
    ///
    /// The key falls back to the `HEYGEN_API_KEY` environment variable and the
    /// host to `HEYGEN_API_HOST`, then to [`DEFAULT_HEYGEN_HOST`].
    ///
    /// # Errors
    ///
    /// - `MediaGenError::MissingApiKey` if no key can be found.
    /// - `MediaGenError::UrlParseFailed` if the host is not a valid URL.
    pub fn new(api_key: Option<String>) -> Result<Self, MediaGenError> {
        let key = resolve_api_key(api_key.as_deref(), &HEYGEN_KEY)?;
        let host = env::var("HEYGEN_API_HOST").unwrap_or_else(|_| DEFAULT_HEYGEN_HOST.to_string());
        Self::new_with_url(key, &host)
    }

    /// Creates a new `HeyGenClient` against a custom base URL, e.g. a mock server.
    pub fn new_with_url(api_key: String, base_url: &str) -> Result<Self, MediaGenError> {
        let client =
            authenticated_client(HeaderName::from_static("x-api-key"), &api_key, SUBMIT_TIMEOUT)?;
        let base_url = parse_base_url(base_url)?;
        Ok(Self { client, base_url })
    }

    /// Submits `job` and returns the provider's video id.
    ///
    /// Every call creates a new remote job; identical payloads are not deduplicated.
    ///
    /// # Errors
    ///
    /// - `MediaGenError::SubmitFailed` for any status other than 200, 201 or 202.
    /// - `MediaGenError::UnrecognizedResponse` if no video id can be found in the body.
    pub async fn submit(&self, job: &VideoJob) -> Result<JobId, MediaGenError> {
        let url = self.base_url.join(job.submit_path())?;
        debug!(%url, "POST");
        let response = self.client.post(url).json(&job.request()).send().await?;

        let (status, body) = status_and_body(response).await?;
        if !matches!(status, 200 | 201 | 202) {
            return Err(MediaGenError::SubmitFailed {
                status,
                body: truncate_body(&body),
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|_| MediaGenError::UnrecognizedResponse {
                body: truncate_body(&body),
            })?;
        let video_id = first_match(&value, HEYGEN_JOB_ID).ok_or_else(|| {
            MediaGenError::UnrecognizedResponse {
                body: truncate_body(&body),
            }
        })?;

        info!(%video_id, "HeyGen job submitted");
        Ok(JobId(video_id))
    }

    /// A [`StatusSource`] for jobs tracked by `endpoint`.
    pub fn status_source(&self, endpoint: StatusEndpoint) -> HeyGenStatus<'_> {
        HeyGenStatus {
            client: self,
            endpoint,
        }
    }

    /// Submits `job`, polls it to completion and saves the video as
    /// `video_<id>.mp4` inside `out_dir`.
    pub async fn generate<P: AsRef<Path>>(
        &self,
        job: &VideoJob,
        poller: &Poller,
        out_dir: P,
    ) -> Result<PathBuf, MediaGenError> {
        let video_id = self.submit(job).await?;
        let out_path = out_dir.as_ref().join(format!("video_{}.mp4", video_id));
        let fetcher = ArtifactFetcher::new()?;
        poller
            .run(
                &self.status_source(job.status_endpoint()),
                &video_id,
                &fetcher,
                out_path,
            )
            .await
    }

    fn status_url(&self, endpoint: StatusEndpoint, job_id: &JobId) -> Result<Url, MediaGenError> {
        let url = match endpoint {
            StatusEndpoint::V1Query => {
                let mut url = self.base_url.join("v1/video.status")?;
                url.query_pairs_mut().append_pair("video_id", job_id.as_str());
                url
            }
            StatusEndpoint::V2Path => push_segment(self.base_url.join("v2/video/")?, job_id.as_str())?,
        };
        Ok(url)
    }
}

/// Status checks for a HeyGen job.
pub struct HeyGenStatus<'a> {
    client: &'a HeyGenClient,
    endpoint: StatusEndpoint,
}

#[async_trait]
impl<'a> StatusSource for HeyGenStatus<'a> {
    async fn check_status(&self, job_id: &JobId) -> Result<StatusReport, MediaGenError> {
        let url = self.client.status_url(self.endpoint, job_id)?;
        let response = self.client.client.get(url).send().await?;

        let (status, body) = status_and_body(response).await?;
        if status != 200 {
            return Err(MediaGenError::StatusCheckFailed {
                status,
                body: truncate_body(&body),
            });
        }

        let value: serde_json::Value = serde_json::from_str(&body)?;
        Ok(status_report(value))
    }
}
