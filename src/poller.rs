//! The submit-then-poll-then-download protocol shared by every provider.

use crate::client::ArtifactFetcher;
use crate::error::{truncate_body, MediaGenError};
use crate::types::{JobId, JobStatus, Locator, PollConfig, StatusReport};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Anything that can report the status of a submitted job.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Issues exactly one status request for `job_id`.
    ///
    /// Implementations return `MediaGenError::StatusCheckFailed` for non-success
    /// responses; they never retry.
    async fn check_status(&self, job_id: &JobId) -> Result<StatusReport, MediaGenError>;
}

/// Drives a [`StatusSource`] until the job reaches a terminal state.
#[derive(Debug, Clone)]
pub struct Poller {
    config: PollConfig,
    cancel: CancellationToken,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(PollConfig::default())
    }
}

impl Poller {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `cancel` to abort a poll in progress. Cancelling the token ends the
    /// current wait or status request immediately with `MediaGenError::Cancelled`.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Polls `job_id` until it completes, fails, times out or is cancelled.
    ///
    /// # Returns
    ///
    /// The locator of the finished artifact.
    ///
    /// # Errors
    ///
    /// - `MediaGenError::JobFailed` when the provider reports a failure.
    /// - `MediaGenError::MissingDownloadLocator` when a completed job has no locator.
    /// - `MediaGenError::Timeout` when `max_wait` elapses without a terminal state.
    /// - `MediaGenError::Cancelled` when the cancellation token fires.
    /// - Any error returned by the source's status check.
    pub async fn poll(
        &self,
        source: &dyn StatusSource,
        job_id: &JobId,
    ) -> Result<Locator, MediaGenError> {
        let started = Instant::now();
        let deadline = started + self.config.max_wait;
        let mut attempts: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(MediaGenError::Cancelled {
                    job_id: job_id.to_string(),
                });
            }

            let report = tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(MediaGenError::Cancelled {
                        job_id: job_id.to_string(),
                    })
                }
                report = source.check_status(job_id) => report?,
            };
            attempts += 1;
            debug!(%job_id, attempts, status = ?report.status, "status checked");

            match report.status {
                JobStatus::Completed => {
                    info!(%job_id, attempts, elapsed = ?started.elapsed(), "job completed");
                    return report
                        .locator
                        .ok_or_else(|| MediaGenError::MissingDownloadLocator {
                            body: truncate_body(&report.body.to_string()),
                        });
                }
                JobStatus::Failed => {
                    return Err(MediaGenError::JobFailed {
                        job_id: job_id.to_string(),
                        body: report.body.to_string(),
                    });
                }
                JobStatus::InProgress => {}
            }

            let now = Instant::now();
            if now > deadline {
                return Err(MediaGenError::Timeout {
                    job_id: job_id.to_string(),
                    waited: now - started,
                });
            }

            self.wait_until(now + self.config.interval, job_id).await?;
        }
    }

    /// Polls `job_id` to completion, then downloads the artifact to `out_path`.
    pub async fn run<P: AsRef<Path>>(
        &self,
        source: &dyn StatusSource,
        job_id: &JobId,
        fetcher: &ArtifactFetcher,
        out_path: P,
    ) -> Result<PathBuf, MediaGenError> {
        let locator = self.poll(source, job_id).await?;
        fetcher.save(&locator, out_path).await
    }

    async fn wait_until(&self, until: Instant, job_id: &JobId) -> Result<(), MediaGenError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(MediaGenError::Cancelled {
                job_id: job_id.to_string(),
            }),
            _ = sleep_until(until) => Ok(()),
        }
    }
}
