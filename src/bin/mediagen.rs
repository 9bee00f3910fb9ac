//! Command-line front end: presenter preview images and talking-avatar videos.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use mediagen::config::{resolve_api_key, HEYGEN_KEY, STABILITY_KEY};
use mediagen::dims::{is_allowed, snap_sdxl, Dimensions};
use mediagen::heygen::DEFAULT_HEYGEN_HOST;
use mediagen::payload::Position;
use mediagen::prompt::{build_prompt, Presenter, NEGATIVE_PROMPT};
use mediagen::stability::DEFAULT_STABILITY_HOST;
use mediagen::{
    write_artifact, AvatarVideo, HeyGenClient, ImageRequest, ImageSource, PollConfig, Poller,
    StabilityClient, TalkingPhoto, TextOverlay, VideoJob, VideoParams,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mediagen")]
#[command(about = "Generate presenter images and talking-avatar videos")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Seconds between two status checks
    #[arg(long, global = true, default_value_t = 8)]
    poll_interval: u64,

    /// Seconds to wait for a job before giving up
    #[arg(long, global = true, default_value_t = 900)]
    max_wait: u64,

    /// Directory the outputs are written to
    #[arg(long, global = true, default_value = "outputs")]
    out_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a presenter preview image
    Image(ImageArgs),

    /// Generate a preview image and animate it into a talking video
    TalkingPhoto(TalkingPhotoArgs),

    /// Render a HeyGen studio avatar reading a script
    Avatar(AvatarArgs),
}

#[derive(Args)]
struct StabilityArgs {
    /// Stability API key (falls back to STABILITY_API_KEY and key files)
    #[arg(long)]
    api_key: Option<String>,

    #[arg(long, env = "API_HOST", default_value = DEFAULT_STABILITY_HOST)]
    api_host: String,
}

#[derive(Args)]
struct HeyGenArgs {
    /// HeyGen API key (falls back to HEYGEN_API_KEY)
    #[arg(long)]
    heygen_api_key: Option<String>,

    #[arg(long, env = "HEYGEN_API_HOST", default_value = DEFAULT_HEYGEN_HOST)]
    heygen_api_host: String,
}

#[derive(Args)]
struct PresenterArgs {
    #[arg(long)]
    character_key: String,

    #[arg(long)]
    identity_descriptor: String,

    #[arg(long)]
    company_name: String,

    /// Text spoken in this segment
    #[arg(long)]
    segment_text: String,
}

#[derive(Args)]
struct ImageArgs {
    #[command(flatten)]
    stability: StabilityArgs,

    #[command(flatten)]
    presenter: PresenterArgs,

    #[arg(long, default_value_t = 1344, value_parser = clap::value_parser!(u32).range(1..))]
    width: u32,

    #[arg(long, default_value_t = 768, value_parser = clap::value_parser!(u32).range(1..))]
    height: u32,

    /// Send the size as given instead of snapping it to a valid SDXL size
    #[arg(long)]
    no_snap: bool,

    #[arg(long, default_value_t = 30)]
    image_steps: u32,

    #[arg(long, default_value_t = 7.0)]
    image_cfg: f64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VideoProvider {
    Heygen,
    Stability,
}

#[derive(Args)]
struct TalkingPhotoArgs {
    #[command(flatten)]
    image: ImageArgs,

    #[command(flatten)]
    heygen: HeyGenArgs,

    #[arg(long, value_enum, default_value = "heygen")]
    provider: VideoProvider,

    /// Animate this image (file path or URL) instead of generating a preview
    #[arg(long = "image")]
    source_image: Option<String>,

    /// HeyGen voice id to use for speech
    #[arg(long)]
    heygen_voice_id: Option<String>,

    #[arg(long, default_value_t = 0)]
    video_seed: u64,

    #[arg(long, default_value_t = 1.8)]
    video_cfg: f64,

    #[arg(long, default_value_t = 127)]
    video_motion: u32,
}

#[derive(Args)]
struct AvatarArgs {
    #[command(flatten)]
    heygen: HeyGenArgs,

    /// Text to be spoken in the video
    #[arg(long)]
    segment_text: String,

    #[arg(long)]
    heygen_voice_id: String,

    #[arg(long)]
    avatar_id: String,

    #[arg(long, default_value = "normal")]
    avatar_style: String,

    #[arg(long, default_value_t = 1.0)]
    avatar_scale: f64,

    #[arg(long, default_value = "stable")]
    talking_style: String,

    #[arg(long, default_value = "default")]
    expression: String,

    #[arg(long)]
    emotion: Option<String>,

    #[arg(long, default_value = "en-US")]
    locale: String,

    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pitch: f64,

    #[arg(long, default_value = "image")]
    background_type: String,

    /// Public image URL for the background when the type is `image`
    #[arg(long)]
    background_url: Option<String>,

    #[arg(long)]
    caption: bool,

    /// Skip the silent intro entry and render only the speaking avatar
    #[arg(long)]
    single_entry: bool,

    #[arg(long)]
    overlay_text: Option<String>,

    #[arg(long, default_value = "Arial")]
    overlay_font_family: String,

    #[arg(long, default_value = "bold")]
    overlay_font_weight: String,

    #[arg(long, default_value = "#050404")]
    overlay_color: String,

    #[arg(long, default_value = "center")]
    overlay_text_align: String,

    #[arg(long)]
    overlay_font_size: Option<f64>,

    #[arg(long)]
    overlay_line_height: Option<f64>,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    overlay_pos_x: i32,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    overlay_pos_y: i32,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    offset_x: i32,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    offset_y: i32,

    #[arg(long)]
    folder_id: Option<String>,

    #[arg(long)]
    callback_url: Option<String>,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let poller = Poller::new(PollConfig {
        interval: Duration::from_secs(cli.poll_interval),
        max_wait: Duration::from_secs(cli.max_wait),
    });

    tokio::fs::create_dir_all(&cli.out_dir)
        .await
        .with_context(|| format!("creating {}", cli.out_dir.display()))?;

    // Dropping the command future aborts whatever request is in flight.
    tokio::select! {
        result = run(cli.command, &poller, &cli.out_dir) => result,
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for Ctrl-C")?;
            warn!("interrupted");
            bail!("interrupted by Ctrl-C")
        }
    }
}

async fn run(command: Commands, poller: &Poller, out_dir: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Image(args) => {
            let stability = stability_client(&args.stability)?;
            preview_image(&stability, &args, out_dir).await?;
        }
        Commands::TalkingPhoto(args) => talking_photo(args, poller, out_dir).await?,
        Commands::Avatar(args) => avatar(args, poller, out_dir).await?,
    }
    Ok(())
}

fn stability_client(args: &StabilityArgs) -> anyhow::Result<StabilityClient> {
    let key = resolve_api_key(args.api_key.as_deref(), &STABILITY_KEY)?;
    Ok(StabilityClient::new_with_url(key, &args.api_host)?)
}

fn heygen_client(args: &HeyGenArgs) -> anyhow::Result<HeyGenClient> {
    let key = resolve_api_key(args.heygen_api_key.as_deref(), &HEYGEN_KEY)?;
    Ok(HeyGenClient::new_with_url(key, &args.heygen_api_host)?)
}

/// Generates the presenter portrait and saves it as `preview_frame.png`.
async fn preview_image(
    stability: &StabilityClient,
    args: &ImageArgs,
    out_dir: &Path,
) -> anyhow::Result<(Vec<u8>, Dimensions)> {
    let mut dims = Dimensions::new(args.width, args.height);
    if !args.no_snap && !is_allowed(dims) {
        let snapped = snap_sdxl(dims);
        info!("Snapping SDXL dims {} -> {}", dims, snapped);
        dims = snapped;
    }

    let presenter = Presenter {
        character_key: &args.presenter.character_key,
        identity_descriptor: &args.presenter.identity_descriptor,
        company_name: &args.presenter.company_name,
    };
    let mut request = ImageRequest::new(build_prompt(&presenter, &args.presenter.segment_text), dims);
    request.negative_prompt = NEGATIVE_PROMPT.to_string();
    request.steps = args.image_steps;
    request.cfg_scale = args.image_cfg;

    info!("Generating preview image...");
    let image = stability.text_to_image(&request).await?;
    let path = write_artifact(out_dir.join("preview_frame.png"), &image).await?;
    info!("Preview saved: {}", path.display());
    Ok((image, dims))
}

async fn talking_photo(
    args: TalkingPhotoArgs,
    poller: &Poller,
    out_dir: &Path,
) -> anyhow::Result<()> {
    // Check the video side before spending credits on the preview image.
    let heygen = match args.provider {
        VideoProvider::Heygen => {
            if args.heygen_voice_id.is_none() {
                bail!("HeyGen requires --heygen-voice-id");
            }
            Some(heygen_client(&args.heygen)?)
        }
        VideoProvider::Stability => None,
    };
    let stability = match (&heygen, &args.source_image) {
        (Some(_), Some(_)) => None,
        _ => Some(stability_client(&args.image.stability)?),
    };

    let (image, dims) = match &args.source_image {
        Some(source) => {
            let dims = Dimensions::new(args.image.width, args.image.height);
            (ImageSource::from_arg(source).await?, dims)
        }
        None => {
            let stability = stability
                .as_ref()
                .context("generating the preview image needs a Stability client")?;
            let (bytes, dims) = preview_image(stability, &args.image, out_dir).await?;
            (ImageSource::png(bytes), dims)
        }
    };

    let path = match (heygen, stability, args.heygen_voice_id) {
        (Some(heygen), _, Some(voice_id)) => {
            info!("Submitting HeyGen talking-photo job...");
            let job = VideoJob::TalkingPhoto(TalkingPhoto {
                image,
                voice_id,
                script: args.image.presenter.segment_text.clone(),
                dimensions: dims,
            });
            heygen.generate(&job, poller, out_dir).await?
        }
        (None, Some(stability), _) => {
            let ImageSource::Bytes { data, .. } = image else {
                bail!("the stability provider needs a local image file, not a URL");
            };
            info!("Submitting image-to-video job...");
            let params = VideoParams {
                seed: args.video_seed,
                cfg_scale: args.video_cfg,
                motion_bucket_id: args.video_motion,
            };
            stability.generate_video(&data, &params, poller, out_dir).await?
        }
        _ => bail!("no video provider configured"),
    };

    info!("Video saved: {}", path.display());
    Ok(())
}

async fn avatar(args: AvatarArgs, poller: &Poller, out_dir: &Path) -> anyhow::Result<()> {
    let heygen = heygen_client(&args.heygen)?;

    let overlay = args.overlay_text.map(|text| {
        let mut overlay = TextOverlay::new(text);
        overlay.position = Position {
            x: args.overlay_pos_x,
            y: args.overlay_pos_y,
        };
        overlay.font_family = args.overlay_font_family;
        overlay.font_weight = args.overlay_font_weight;
        overlay.color = args.overlay_color;
        overlay.text_align = args.overlay_text_align;
        overlay.font_size = args.overlay_font_size;
        overlay.line_height = args.overlay_line_height;
        overlay
    });

    let mut video = AvatarVideo::new(args.avatar_id, args.heygen_voice_id, args.segment_text);
    video.avatar_style = args.avatar_style;
    video.avatar_scale = args.avatar_scale;
    video.talking_style = args.talking_style;
    video.expression = args.expression;
    video.offset = Position {
        x: args.offset_x,
        y: args.offset_y,
    };
    video.locale = args.locale;
    video.speed = args.speed;
    video.pitch = args.pitch;
    video.emotion = args.emotion;
    video.background_type = args.background_type;
    video.background_url = args.background_url;
    video.overlay = overlay;
    video.caption = args.caption;
    video.dimensions = Dimensions::new(args.width, args.height);
    video.folder_id = args.folder_id;
    video.callback_url = args.callback_url;
    video.intro_entry = !args.single_entry;

    info!("Submitting HeyGen video.generate job...");
    let path = heygen.generate(&VideoJob::Avatar(video), poller, out_dir).await?;
    info!("Video saved: {}", path.display());
    Ok(())
}
