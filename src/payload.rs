//! Request bodies for HeyGen video jobs.
//!
//! Talking-photo and avatar videos share one request shape; [`VideoJob`]
//! selects the endpoint and which `video_inputs` entries are emitted.

use base64::prelude::*;
use serde::Serialize;
use std::path::Path;

use crate::dims::{aspect_ratio_label, Dimensions};
use crate::error::MediaGenError;

/// The portrait used for a talking-photo job.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Raw image bytes, sent inline as a `data:` URL.
    Bytes { data: Vec<u8>, mime: String },
    /// A publicly reachable image URL.
    Url(String),
}

impl ImageSource {
    pub fn png(data: Vec<u8>) -> Self {
        Self::Bytes {
            data,
            mime: "image/png".to_string(),
        }
    }

    /// Reads an image file, guessing its MIME type from the extension.
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, MediaGenError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(Self::Bytes { data, mime })
    }

    /// Treats `http(s)://` inputs as URLs and anything else as a file path.
    pub async fn from_arg(arg: &str) -> Result<Self, MediaGenError> {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            Ok(Self::Url(arg.to_string()))
        } else {
            Self::from_path(arg).await
        }
    }

    fn to_url(&self) -> String {
        match self {
            Self::Bytes { data, mime } => {
                format!("data:{};base64,{}", mime, BASE64_STANDARD.encode(data))
            }
            Self::Url(url) => url.clone(),
        }
    }
}

/// A single photo brought to life with a text-to-speech voice.
#[derive(Debug, Clone)]
pub struct TalkingPhoto {
    pub image: ImageSource,
    pub voice_id: String,
    pub script: String,
    pub dimensions: Dimensions,
}

/// Text drawn on top of the speaking entry.
#[derive(Debug, Clone, Serialize)]
pub struct TextOverlay {
    #[serde(rename = "type")]
    type_: &'static str,
    pub text: String,
    pub position: Position,
    pub font_family: String,
    pub font_weight: String,
    pub color: String,
    pub text_align: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
}

impl TextOverlay {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            type_: "text",
            text: text.into(),
            position: Position { x: 0, y: 0 },
            font_family: "Arial".to_string(),
            font_weight: "bold".to_string(),
            color: "#050404".to_string(),
            text_align: "center".to_string(),
            font_size: None,
            line_height: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// A studio avatar reading a script.
#[derive(Debug, Clone)]
pub struct AvatarVideo {
    pub avatar_id: String,
    pub voice_id: String,
    pub script: String,
    pub avatar_style: String,
    pub avatar_scale: f64,
    pub talking_style: String,
    pub expression: String,
    /// Shift of the speaking avatar; omitted from the request when zero.
    pub offset: Position,
    pub locale: String,
    pub speed: f64,
    pub pitch: f64,
    pub emotion: Option<String>,
    pub background_type: String,
    /// Image for the intro entry's background, used when `background_type` is `image`.
    pub background_url: Option<String>,
    pub overlay: Option<TextOverlay>,
    pub caption: bool,
    pub dimensions: Dimensions,
    pub folder_id: Option<String>,
    pub callback_url: Option<String>,
    /// Emit a silent avatar-and-background entry ahead of the speaking one.
    pub intro_entry: bool,
}

impl AvatarVideo {
    pub fn new(
        avatar_id: impl Into<String>,
        voice_id: impl Into<String>,
        script: impl Into<String>,
    ) -> Self {
        Self {
            avatar_id: avatar_id.into(),
            voice_id: voice_id.into(),
            script: script.into(),
            avatar_style: "normal".to_string(),
            avatar_scale: 1.0,
            talking_style: "stable".to_string(),
            expression: "default".to_string(),
            offset: Position { x: 0, y: 0 },
            locale: "en-US".to_string(),
            speed: 1.0,
            pitch: 0.0,
            emotion: None,
            background_type: "image".to_string(),
            background_url: None,
            overlay: None,
            caption: false,
            dimensions: Dimensions::new(1280, 720),
            folder_id: None,
            callback_url: None,
            intro_entry: true,
        }
    }
}

/// Which HeyGen status endpoint tracks a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEndpoint {
    /// `GET v1/video.status?video_id=<id>`
    V1Query,
    /// `GET v2/video/<id>`
    V2Path,
}

/// A HeyGen video job, ready to submit.
#[derive(Debug, Clone)]
pub enum VideoJob {
    TalkingPhoto(TalkingPhoto),
    Avatar(AvatarVideo),
}

impl VideoJob {
    pub fn submit_path(&self) -> &'static str {
        match self {
            Self::TalkingPhoto(_) => "v1/video.create",
            Self::Avatar(_) => "v2/video/generate",
        }
    }

    pub fn status_endpoint(&self) -> StatusEndpoint {
        match self {
            Self::TalkingPhoto(_) => StatusEndpoint::V1Query,
            Self::Avatar(_) => StatusEndpoint::V2Path,
        }
    }

    /// Builds the JSON request body.
    pub fn request(&self) -> GenerateRequest {
        match self {
            Self::TalkingPhoto(job) => talking_photo_request(job),
            Self::Avatar(job) => avatar_request(job),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<bool>,
    dimension: Dimension,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<String>,
    video_inputs: Vec<VideoInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    folder_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct Dimension {
    width: u32,
    height: u32,
}

impl From<Dimensions> for Dimension {
    fn from(dims: Dimensions) -> Self {
        Self {
            width: dims.width,
            height: dims.height,
        }
    }
}

#[derive(Debug, Serialize)]
struct VideoInput {
    character: Character,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice: Option<Voice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    background: Option<Background>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextOverlay>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Character {
    Image { image_url: String },
    Avatar { avatar: Avatar },
}

#[derive(Debug, Serialize)]
struct Avatar {
    avatar_id: String,
    scale: f64,
    avatar_style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    talking_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<Position>,
}

#[derive(Debug, Serialize)]
struct Voice {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    type_: Option<&'static str>,
    voice_id: String,
    input_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pitch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    emotion: Option<String>,
}

#[derive(Debug, Serialize)]
struct Background {
    #[serde(rename = "type")]
    type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
}

fn talking_photo_request(job: &TalkingPhoto) -> GenerateRequest {
    GenerateRequest {
        caption: None,
        dimension: job.dimensions.into(),
        aspect_ratio: Some(aspect_ratio_label(job.dimensions)),
        video_inputs: vec![VideoInput {
            character: Character::Image {
                image_url: job.image.to_url(),
            },
            voice: Some(Voice {
                type_: None,
                voice_id: job.voice_id.clone(),
                input_text: job.script.clone(),
                locale: None,
                speed: None,
                pitch: None,
                emotion: None,
            }),
            background: None,
            text: None,
        }],
        folder_id: None,
        callback_url: None,
    }
}

fn avatar_request(job: &AvatarVideo) -> GenerateRequest {
    let background_image = job
        .background_url
        .clone()
        .filter(|_| job.background_type == "image");

    let mut video_inputs = Vec::with_capacity(2);
    if job.intro_entry {
        video_inputs.push(VideoInput {
            character: Character::Avatar {
                avatar: Avatar {
                    avatar_id: job.avatar_id.clone(),
                    scale: job.avatar_scale,
                    avatar_style: job.avatar_style.clone(),
                    talking_style: None,
                    expression: None,
                    offset: None,
                },
            },
            voice: None,
            background: Some(Background {
                type_: job.background_type.clone(),
                image_url: background_image.clone(),
            }),
            text: None,
        });
    }

    let offset = (job.offset != Position { x: 0, y: 0 }).then_some(job.offset);
    video_inputs.push(VideoInput {
        character: Character::Avatar {
            avatar: Avatar {
                avatar_id: job.avatar_id.clone(),
                scale: job.avatar_scale,
                avatar_style: job.avatar_style.clone(),
                talking_style: Some(job.talking_style.clone()),
                expression: Some(job.expression.clone()),
                offset,
            },
        },
        voice: Some(Voice {
            type_: Some("text"),
            voice_id: job.voice_id.clone(),
            input_text: job.script.clone(),
            locale: Some(job.locale.clone()),
            speed: Some(job.speed),
            pitch: Some(job.pitch),
            emotion: job.emotion.clone(),
        }),
        // A lone speaking entry carries the background image itself.
        background: Some(Background {
            type_: job.background_type.clone(),
            image_url: if job.intro_entry { None } else { background_image },
        }),
        text: job.overlay.clone(),
    });

    GenerateRequest {
        caption: Some(job.caption),
        dimension: job.dimensions.into(),
        aspect_ratio: None,
        video_inputs,
        folder_id: job.folder_id.clone(),
        callback_url: job.callback_url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn to_json(job: &VideoJob) -> Value {
        serde_json::to_value(job.request()).unwrap()
    }

    #[test]
    fn talking_photo_inlines_image_as_data_url() {
        let job = VideoJob::TalkingPhoto(TalkingPhoto {
            image: ImageSource::png(b"png".to_vec()),
            voice_id: "voice-1".into(),
            script: "Hello there".into(),
            dimensions: Dimensions::new(1280, 720),
        });

        assert_eq!(job.submit_path(), "v1/video.create");
        assert_eq!(job.status_endpoint(), StatusEndpoint::V1Query);
        assert_eq!(
            to_json(&job),
            json!({
                "dimension": { "width": 1280, "height": 720 },
                "aspect_ratio": "16:9",
                "video_inputs": [{
                    "character": { "type": "image", "image_url": "data:image/png;base64,cG5n" },
                    "voice": { "voice_id": "voice-1", "input_text": "Hello there" }
                }]
            })
        );
    }

    #[test]
    fn avatar_video_has_intro_and_speaking_entries() {
        let mut avatar = AvatarVideo::new("av-1", "voice-2", "Welcome");
        avatar.background_url = Some("https://img.example/office.png".into());
        avatar.emotion = Some("Friendly".into());
        avatar.offset = Position { x: 10, y: -5 };
        avatar.folder_id = Some("folder-9".into());
        let job = VideoJob::Avatar(avatar);

        assert_eq!(job.submit_path(), "v2/video/generate");
        assert_eq!(job.status_endpoint(), StatusEndpoint::V2Path);
        assert_eq!(
            to_json(&job),
            json!({
                "caption": false,
                "dimension": { "width": 1280, "height": 720 },
                "folder_id": "folder-9",
                "video_inputs": [
                    {
                        "character": {
                            "type": "avatar",
                            "avatar": { "avatar_id": "av-1", "scale": 1.0, "avatar_style": "normal" }
                        },
                        "background": { "type": "image", "image_url": "https://img.example/office.png" }
                    },
                    {
                        "character": {
                            "type": "avatar",
                            "avatar": {
                                "avatar_id": "av-1",
                                "scale": 1.0,
                                "avatar_style": "normal",
                                "talking_style": "stable",
                                "expression": "default",
                                "offset": { "x": 10, "y": -5 }
                            }
                        },
                        "voice": {
                            "type": "text",
                            "voice_id": "voice-2",
                            "input_text": "Welcome",
                            "locale": "en-US",
                            "speed": 1.0,
                            "pitch": 0.0,
                            "emotion": "Friendly"
                        },
                        "background": { "type": "image" }
                    }
                ]
            })
        );
    }

    #[test]
    fn single_entry_avatar_keeps_background_image_and_overlay() {
        let mut avatar = AvatarVideo::new("av-1", "voice-2", "Welcome");
        avatar.intro_entry = false;
        avatar.background_url = Some("https://img.example/office.png".into());
        let mut overlay = TextOverlay::new("Q3 results");
        overlay.font_size = Some(32.0);
        avatar.overlay = Some(overlay);

        let body = to_json(&VideoJob::Avatar(avatar));
        let inputs = body["video_inputs"].as_array().unwrap();

        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0]["background"]["image_url"], "https://img.example/office.png");
        assert!(inputs[0]["character"]["avatar"].get("offset").is_none());
        assert_eq!(inputs[0]["text"]["type"], "text");
        assert_eq!(inputs[0]["text"]["font_size"], 32.0);
        assert!(inputs[0]["text"].get("line_height").is_none());
    }

    #[tokio::test]
    async fn image_sources_from_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        match ImageSource::from_arg(path.to_str().unwrap()).await.unwrap() {
            ImageSource::Bytes { data, mime } => {
                assert_eq!(data, b"jpeg");
                assert_eq!(mime, "image/jpeg");
            }
            other => panic!("expected bytes, got {other:?}"),
        }
        assert!(matches!(
            ImageSource::from_arg("https://img.example/face.png").await.unwrap(),
            ImageSource::Url(url) if url == "https://img.example/face.png"
        ));
        assert!(ImageSource::from_arg("/definitely/missing.png").await.is_err());
    }

    #[test]
    fn non_image_background_drops_url() {
        let mut avatar = AvatarVideo::new("av-1", "voice-2", "Welcome");
        avatar.background_type = "color".into();
        avatar.background_url = Some("https://img.example/office.png".into());

        let body = to_json(&VideoJob::Avatar(avatar));

        assert_eq!(body["video_inputs"][0]["background"], json!({ "type": "color" }));
    }
}
