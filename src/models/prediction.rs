use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

use super::generation::GenerationRequest;

pub const DEFAULT_MODEL_VERSION: &str =
    "stability-ai/stable-video-diffusion:3d94c345dce0-svd-ddpm-xt";

const NEGATIVE_PROMPT: &str = "blurry, low quality, distorted, deformed";
const NUM_FRAMES: u32 = 14;
const FPS: u32 = 7;
const NUM_INFERENCE_STEPS: u32 = 25;
const MIN_GUIDANCE_SCALE: f64 = 1.0;
const MAX_GUIDANCE_SCALE: f64 = 7.5;
const MOTION_BUCKET_ID: u32 = 127;
const SEED_RANGE: u32 = 1_000_000;

/// Lifecycle state of a prediction as reported by the inference API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

/// One asynchronous generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default, deserialize_with = "output_url")]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /predictions`.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionRequest {
    pub version: String,
    pub input: PredictionInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionInput {
    pub prompt: String,
    pub negative_prompt: String,
    pub num_frames: u32,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub num_inference_steps: u32,
    pub min_guidance_scale: f64,
    pub max_guidance_scale: f64,
    pub motion_bucket_id: u32,
    pub seed: u32,
}

impl PredictionRequest {
    /// Build the upstream payload. The model renders a fixed number of frames,
    /// so the requested duration is not forwarded.
    pub fn new(version: &str, request: &GenerationRequest, seed: u32) -> Self {
        Self {
            version: version.to_string(),
            input: PredictionInput {
                prompt: request.description.clone(),
                negative_prompt: NEGATIVE_PROMPT.to_string(),
                num_frames: NUM_FRAMES,
                width: request.width,
                height: request.height,
                fps: FPS,
                num_inference_steps: NUM_INFERENCE_STEPS,
                min_guidance_scale: MIN_GUIDANCE_SCALE,
                max_guidance_scale: MAX_GUIDANCE_SCALE,
                motion_bucket_id: MOTION_BUCKET_ID,
                seed,
            },
        }
    }

    pub fn with_random_seed(version: &str, request: &GenerationRequest) -> Self {
        Self::new(version, request, random_seed())
    }
}

/// Prediction ids are opaque but only ever use URL-safe characters.
pub fn is_valid_prediction_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

pub fn random_seed() -> u32 {
    rand::thread_rng().gen_range(0..SEED_RANGE)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OutputField {
    Url(String),
    Urls(Vec<String>),
}

// Some models return a list of files; the final entry is the rendered video.
fn output_url<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OutputField>::deserialize(deserializer)? {
        Some(OutputField::Url(url)) => Some(url),
        Some(OutputField::Urls(urls)) => urls.into_iter().last(),
        None => None,
    })
}
