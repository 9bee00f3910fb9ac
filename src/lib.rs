//! Submit-and-poll client for generative media APIs.
//!
//! This crate drives the job protocol used by image-generation and
//! talking-avatar video services: submit a job, poll its status until it
//! completes, fails or times out, then download the finished asset.
//!
//! ## Features
//! - Snapping of requested sizes onto the sizes SDXL accepts.
//! - Stability text-to-image and image-to-video, with endpoint fallbacks.
//! - HeyGen talking-photo and avatar videos from one payload builder.
//! - A cancellable, deadline-bounded poll loop shared by all providers.
//! - Typed errors that tell provider failures, timeouts and protocol
//!   violations apart.
//!
//! ```no_run
//! # use mediagen::{AvatarVideo, HeyGenClient, Poller, VideoJob};
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let client = HeyGenClient::new(None)?;
//! let job = VideoJob::Avatar(AvatarVideo::new("avatar_id", "voice_id", "Hello!"));
//! let path = client.generate(&job, &Poller::default(), "outputs").await?;
//! println!("saved {}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod dims;
pub mod error;
pub mod extract;
pub mod heygen;
pub mod payload;
pub mod poller;
pub mod prompt;
pub mod stability;
pub mod types;

pub use client::{write_artifact, ArtifactFetcher};
pub use dims::{snap_sdxl, snap_to, Dimensions, ALLOWED_SDXL_DIMS};
pub use error::MediaGenError;
pub use heygen::HeyGenClient;
pub use payload::{AvatarVideo, ImageSource, StatusEndpoint, TalkingPhoto, TextOverlay, VideoJob};
pub use poller::{Poller, StatusSource};
pub use stability::{ImageRequest, StabilityClient, Submission, VideoParams, VideoVariant};
pub use types::{JobId, JobStatus, Locator, PollConfig, StatusReport};
