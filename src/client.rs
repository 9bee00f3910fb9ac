use crate::error::{truncate_body, MediaGenError};
use crate::types::Locator;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::Response;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(180);

/// Builds a `reqwest::Client` that sends `api_key` under `header` on every request.
pub(crate) fn authenticated_client(
    header: HeaderName,
    api_key: &str,
    timeout: Duration,
) -> Result<reqwest::Client, MediaGenError> {
    let mut key =
        HeaderValue::from_str(api_key.trim()).map_err(|_| MediaGenError::InvalidApiKey)?;
    key.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(header, key);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()?)
}

/// Parses `base_url`, making sure it ends with a slash so that
/// `Url::join` appends endpoint paths instead of replacing the last segment.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, MediaGenError> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Appends `segment` to the path of `url` as a single, percent-encoded segment.
pub(crate) fn push_segment(mut url: Url, segment: &str) -> Result<Url, MediaGenError> {
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

/// Reads a response body as text and returns it with its status code.
pub(crate) async fn status_and_body(response: Response) -> Result<(u16, String), MediaGenError> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    debug!(status, body = %truncate_body(&body), "response");
    Ok((status, body))
}

/// Downloads finished artifacts and writes them to disk.
///
/// Locator URLs are usually pre-signed CDN links, so no API key is sent.
#[derive(Clone)]
pub struct ArtifactFetcher {
    client: reqwest::Client,
}

impl ArtifactFetcher {
    pub fn new() -> Result<Self, MediaGenError> {
        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Fetches the bytes behind `locator`.
    ///
    /// # Errors
    ///
    /// - `MediaGenError::DownloadFailed` if the server answers with a non-success status.
    /// - `MediaGenError::RequestFailed` on transport errors.
    pub async fn fetch(&self, locator: &Locator) -> Result<bytes::Bytes, MediaGenError> {
        match locator {
            Locator::Inline(bytes) => Ok(bytes.clone()),
            Locator::Url(url) => {
                info!(%url, "downloading artifact");
                let response = self.client.get(url).send().await?;
                if !response.status().is_success() {
                    let (status, body) = status_and_body(response).await?;
                    return Err(MediaGenError::DownloadFailed {
                        status,
                        body: truncate_body(&body),
                    });
                }
                Ok(response.bytes().await?)
            }
        }
    }

    /// Fetches the artifact and writes it verbatim to `out_path`.
    ///
    /// # Returns
    ///
    /// The path the artifact was written to.
    pub async fn save<P: AsRef<Path>>(
        &self,
        locator: &Locator,
        out_path: P,
    ) -> Result<PathBuf, MediaGenError> {
        let content = self.fetch(locator).await?;
        write_artifact(out_path, &content).await
    }
}

/// Writes `content` to `out_path` in one go.
pub async fn write_artifact<P: AsRef<Path>>(
    out_path: P,
    content: &[u8],
) -> Result<PathBuf, MediaGenError> {
    let out_path = out_path.as_ref().to_path_buf();
    let mut file = fs::File::create(&out_path).await?;
    file.write_all(content).await?;
    file.flush().await?;
    info!(path = %out_path.display(), bytes = content.len(), "artifact saved");
    Ok(out_path)
}
