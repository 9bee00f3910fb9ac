//! Resumes an already submitted HeyGen job:
//! 1. Takes a video id (and optionally `v1` for talking-photo jobs) from the command line.
//! 2. Polls the job until it completes, fails or times out.
//! 3. Downloads the video into the system temp directory.
//!
//! To run this demo, you must have the `HEYGEN_API_KEY` environment variable set.
//!
//! Usage:
//! `cargo run --example wait_and_download <VIDEO_ID> [v1|v2]`

use mediagen::{ArtifactFetcher, HeyGenClient, JobId, MediaGenError, Poller, StatusEndpoint};
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let client = HeyGenClient::new(None)?;

    let video_id = env::args()
        .nth(1)
        .map(JobId)
        .ok_or_else(|| anyhow::anyhow!("Please provide a video id as a command-line argument."))?;
    let endpoint = match env::args().nth(2).as_deref() {
        Some("v1") => StatusEndpoint::V1Query,
        _ => StatusEndpoint::V2Path,
    };

    let out_dir = env::temp_dir().join("mediagen_download");
    tokio::fs::create_dir_all(&out_dir).await?;
    let out_path = out_dir.join(format!("video_{}.mp4", video_id));

    println!("\nWaiting for video `{}` to complete...", video_id);
    let result = Poller::default()
        .run(
            &client.status_source(endpoint),
            &video_id,
            &ArtifactFetcher::new()?,
            &out_path,
        )
        .await;

    match result {
        Ok(path) => {
            println!("\nVideo downloaded to {}", path.display());
        }
        Err(MediaGenError::Timeout { waited, .. }) => {
            eprintln!("\nStill rendering after {:?}; try again later.", waited);
        }
        Err(e) => {
            eprintln!("\nError waiting for video: {}", e);
        }
    }

    Ok(())
}
