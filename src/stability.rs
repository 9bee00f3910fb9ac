use crate::client::{
    authenticated_client, parse_base_url, push_segment, status_and_body, ArtifactFetcher,
};
use crate::config::{resolve_api_key, STABILITY_KEY};
use crate::dims::Dimensions;
use crate::error::{truncate_body, MediaGenError};
use crate::extract::{first_match, STABILITY_GENERATION_ID};
use crate::poller::{Poller, StatusSource};
use crate::types::{JobId, JobStatus, Locator, StatusReport};
use async_trait::async_trait;
use base64::prelude::*;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_STABILITY_HOST: &str = "https://api.stability.ai";

const SDXL_ENGINE: &str = "stable-diffusion-xl-1024-v1-0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Parameters for a text-to-image generation.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    /// Sent with weight -1 when non-empty.
    pub negative_prompt: String,
    pub dimensions: Dimensions,
    pub steps: u32,
    pub cfg_scale: f64,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>, dimensions: Dimensions) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: String::new(),
            dimensions,
            steps: 30,
            cfg_scale: 7.0,
        }
    }
}

#[derive(Serialize)]
struct TextPrompt<'a> {
    text: &'a str,
    weight: f64,
}

#[derive(Serialize)]
struct TextToImageBody<'a> {
    text_prompts: Vec<TextPrompt<'a>>,
    cfg_scale: f64,
    width: u32,
    height: u32,
    samples: u32,
    steps: u32,
}

#[derive(Deserialize)]
struct TextToImageResponse {
    #[serde(default)]
    artifacts: Vec<ImageArtifact>,
}

#[derive(Deserialize)]
struct ImageArtifact {
    base64: String,
}

/// Motion controls for image-to-video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoParams {
    pub seed: u64,
    pub cfg_scale: f64,
    pub motion_bucket_id: u32,
}

impl Default for VideoParams {
    fn default() -> Self {
        Self {
            seed: 0,
            cfg_scale: 1.8,
            motion_bucket_id: 127,
        }
    }
}

/// The API generation that accepted an image-to-video submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoVariant {
    V2Alpha,
    V2Beta,
}

impl VideoVariant {
    const ALL: [VideoVariant; 2] = [VideoVariant::V2Alpha, VideoVariant::V2Beta];

    fn submit_path(self) -> &'static str {
        match self {
            Self::V2Alpha => "v2alpha/generation/image-to-video",
            Self::V2Beta => "v2beta/image-to-video",
        }
    }

    fn result_url(self, base_url: &Url, id: &JobId) -> Result<Url, MediaGenError> {
        let results = base_url.join(&format!("{}/result/", self.submit_path()))?;
        push_segment(results, id.as_str())
    }

    fn other(self) -> Self {
        match self {
            Self::V2Alpha => Self::V2Beta,
            Self::V2Beta => Self::V2Alpha,
        }
    }
}

/// An accepted image-to-video job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: JobId,
    pub variant: VideoVariant,
}

/// Client for the Stability image and image-to-video APIs.
#[derive(Clone)]
pub struct StabilityClient {
    client: reqwest::Client,
    base_url: Url,
}

impl StabilityClient {
    /// Creates a new `StabilityClient`.
    ///
    /// The key falls back to `STABILITY_API_KEY`, then to
    /// `~/.config/stabilityai/api_key` and `~/.stabilityai.key`. The host comes
    /// from `API_HOST` or [`DEFAULT_STABILITY_HOST`].
    pub fn new(api_key: Option<String>) -> Result<Self, MediaGenError> {
        let key = resolve_api_key(api_key.as_deref(), &STABILITY_KEY)?;
        let host = env::var("API_HOST").unwrap_or_else(|_| DEFAULT_STABILITY_HOST.to_string());
        Self::new_with_url(key, &host)
    }

    /// Creates a new `StabilityClient` against a custom base URL.
    pub fn new_with_url(api_key: String, base_url: &str) -> Result<Self, MediaGenError> {
        let client = authenticated_client(
            AUTHORIZATION,
            &format!("Bearer {}", api_key.trim()),
            REQUEST_TIMEOUT,
        )?;
        let base_url = parse_base_url(base_url)?;
        Ok(Self { client, base_url })
    }

    /// Generates one SDXL image and returns its decoded bytes.
    ///
    /// The size is sent as given; snap it with [`crate::dims::snap_sdxl`] first.
    ///
    /// # Errors
    ///
    /// - `MediaGenError::ImageGenerationFailed` for any status other than 200.
    /// - `MediaGenError::UnrecognizedResponse` if the response has no artifact.
    pub async fn text_to_image(&self, request: &ImageRequest) -> Result<Vec<u8>, MediaGenError> {
        let url = self
            .base_url
            .join(&format!("v1/generation/{}/text-to-image", SDXL_ENGINE))?;

        let mut text_prompts = vec![TextPrompt {
            text: &request.prompt,
            weight: 1.0,
        }];
        if !request.negative_prompt.is_empty() {
            text_prompts.push(TextPrompt {
                text: &request.negative_prompt,
                weight: -1.0,
            });
        }
        let body = TextToImageBody {
            text_prompts,
            cfg_scale: request.cfg_scale,
            width: request.dimensions.width,
            height: request.dimensions.height,
            samples: 1,
            steps: request.steps,
        };

        debug!(%url, dims = %request.dimensions, "POST");
        let response = self.client.post(url).json(&body).send().await?;
        let (status, text) = status_and_body(response).await?;
        if status != 200 {
            return Err(MediaGenError::ImageGenerationFailed {
                status,
                body: truncate_body(&text),
            });
        }

        let parsed: TextToImageResponse = serde_json::from_str(&text)?;
        let artifact = parsed
            .artifacts
            .into_iter()
            .next()
            .ok_or_else(|| MediaGenError::UnrecognizedResponse {
                body: truncate_body(&text),
            })?;
        Ok(BASE64_STANDARD.decode(artifact.base64)?)
    }

    /// Submits an image-to-video job, trying each known endpoint variant in turn.
    ///
    /// A variant is skipped when it answers 404/405 or returns 200 without a
    /// generation id.
    ///
    /// # Errors
    ///
    /// - `MediaGenError::SubmitFailed` on any other non-200 status.
    /// - `MediaGenError::EndpointsExhausted` when no variant accepted the job.
    pub async fn submit_image_to_video(
        &self,
        image: &[u8],
        params: &VideoParams,
    ) -> Result<Submission, MediaGenError> {
        let mut last_error = String::from("no endpoint variant tried");

        for variant in VideoVariant::ALL {
            let url = self.base_url.join(variant.submit_path())?;
            let image_part = multipart::Part::bytes(image.to_vec())
                .file_name("frame.png")
                .mime_str("image/png")?;
            let form = multipart::Form::new()
                .part("image", image_part)
                .text("seed", params.seed.to_string())
                .text("cfg_scale", params.cfg_scale.to_string())
                .text("motion_bucket_id", params.motion_bucket_id.to_string());

            debug!(%url, "POST");
            let response = self.client.post(url).multipart(form).send().await?;
            let (status, body) = status_and_body(response).await?;

            match status {
                200 => {
                    let id = serde_json::from_str::<serde_json::Value>(&body)
                        .ok()
                        .and_then(|value| first_match(&value, STABILITY_GENERATION_ID));
                    if let Some(id) = id {
                        info!(generation_id = %id, ?variant, "image-to-video job submitted");
                        return Ok(Submission {
                            id: JobId(id),
                            variant,
                        });
                    }
                    last_error = format!("Unexpected response: {}", truncate_body(&body));
                }
                404 | 405 => {
                    warn!(?variant, status, "endpoint variant unavailable, trying next");
                    last_error = format!("{} {}", status, truncate_body(&body));
                }
                _ => {
                    return Err(MediaGenError::SubmitFailed {
                        status,
                        body: truncate_body(&body),
                    })
                }
            }
        }

        Err(MediaGenError::EndpointsExhausted { last_error })
    }

    /// A [`StatusSource`] for `submission`, starting at the variant that accepted it.
    pub fn video_result(&self, submission: &Submission) -> StabilityVideoStatus<'_> {
        StabilityVideoStatus {
            client: self,
            candidates: [submission.variant, submission.variant.other()],
            cursor: AtomicUsize::new(0),
        }
    }

    /// Submits `image`, polls the job and saves `video_<id>.mp4` inside `out_dir`.
    pub async fn generate_video<P: AsRef<Path>>(
        &self,
        image: &[u8],
        params: &VideoParams,
        poller: &Poller,
        out_dir: P,
    ) -> Result<PathBuf, MediaGenError> {
        let submission = self.submit_image_to_video(image, params).await?;
        let out_path = out_dir
            .as_ref()
            .join(format!("video_{}.mp4", submission.id));
        let fetcher = ArtifactFetcher::new()?;
        poller
            .run(&self.video_result(&submission), &submission.id, &fetcher, out_path)
            .await
    }
}

/// Result polling for an image-to-video job.
///
/// 202 means still rendering and 200 carries the video itself. A 404 moves on
/// to the next endpoint variant without waiting.
pub struct StabilityVideoStatus<'a> {
    client: &'a StabilityClient,
    candidates: [VideoVariant; 2],
    cursor: AtomicUsize,
}

#[async_trait]
impl<'a> StatusSource for StabilityVideoStatus<'a> {
    async fn check_status(&self, job_id: &JobId) -> Result<StatusReport, MediaGenError> {
        loop {
            let index = self.cursor.load(Ordering::SeqCst);
            let Some(variant) = self.candidates.get(index).copied() else {
                return Err(MediaGenError::EndpointsExhausted {
                    last_error: "video result not found on any known endpoint variant".to_string(),
                });
            };

            let url = variant.result_url(&self.client.base_url, job_id)?;
            let response = self
                .client
                .client
                .get(url)
                .header(ACCEPT, HeaderValue::from_static("video/*"))
                .send()
                .await?;

            match response.status().as_u16() {
                202 => {
                    let body = response.text().await?;
                    let body = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
                    return Ok(StatusReport::in_progress(body));
                }
                200 => {
                    let bytes = response.bytes().await?;
                    return Ok(StatusReport {
                        status: JobStatus::Completed,
                        locator: Some(Locator::Inline(bytes)),
                        body: serde_json::Value::Null,
                    });
                }
                404 => {
                    debug!(?variant, "result endpoint not found, trying next variant");
                    self.cursor.fetch_add(1, Ordering::SeqCst);
                }
                _ => {
                    let (status, body) = status_and_body(response).await?;
                    return Err(MediaGenError::StatusCheckFailed {
                        status,
                        body: truncate_body(&body),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_urls_follow_variant() {
        let base = parse_base_url("https://api.stability.ai").unwrap();
        let id = JobId::from("gen-1");
        assert_eq!(
            VideoVariant::V2Alpha.result_url(&base, &id).unwrap().as_str(),
            "https://api.stability.ai/v2alpha/generation/image-to-video/result/gen-1"
        );
        assert_eq!(
            VideoVariant::V2Beta.result_url(&base, &id).unwrap().as_str(),
            "https://api.stability.ai/v2beta/image-to-video/result/gen-1"
        );
        assert_eq!(
            VideoVariant::V2Beta
                .result_url(&base, &JobId::from("gen#1"))
                .unwrap()
                .as_str(),
            "https://api.stability.ai/v2beta/image-to-video/result/gen%231"
        );
        assert_eq!(VideoVariant::V2Beta.other(), VideoVariant::V2Alpha);
    }

    #[test]
    fn image_request_defaults() {
        let request = ImageRequest::new("a portrait", Dimensions::new(1344, 768));
        assert_eq!(request.steps, 30);
        assert_eq!(request.cfg_scale, 7.0);
        assert!(request.negative_prompt.is_empty());
    }
}
