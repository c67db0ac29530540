//! Fixed-interval polling of a prediction until it reaches a terminal state.

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::models::generation::GenerationRequest;
use crate::models::prediction::{Prediction, PredictionStatus};
use crate::services::proxy_client::{ClientError, ProxyClient};

const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
const PROCESSING_CEILING: u8 = 90;

/// Something that can report the current state of a prediction.
pub trait PredictionSource {
    fn fetch(&self, id: &str) -> impl Future<Output = Result<Prediction, ClientError>> + Send;
}

/// A source that can also start new predictions.
pub trait PredictionSubmitter: PredictionSource {
    fn submit(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<Prediction, ClientError>> + Send;
}

impl PredictionSource for ProxyClient {
    fn fetch(&self, id: &str) -> impl Future<Output = Result<Prediction, ClientError>> + Send {
        self.check_status(id)
    }
}

impl PredictionSubmitter for ProxyClient {
    fn submit(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<Prediction, ClientError>> + Send {
        self.generate_video(request)
    }
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    /// Give up after this many status checks. `None` polls until a terminal state.
    pub max_polls: Option<u32>,
}

impl PollConfig {
    fn validate(&self) -> Result<(), PollError> {
        if self.interval.is_zero() {
            return Err(PollError::InvalidConfig("poll interval must be non-zero"));
        }
        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_polls: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub percent: u8,
    pub message: String,
}

impl Progress {
    fn new(percent: u8, message: impl Into<String>) -> Self {
        Self {
            percent,
            message: message.into(),
        }
    }
}

/// Maps observed statuses onto a progress percentage.
#[derive(Debug)]
pub struct ProgressTracker {
    percent: u8,
}

impl ProgressTracker {
    pub fn new(percent: u8) -> Self {
        Self { percent }
    }

    pub fn observe(&mut self, status: PredictionStatus) -> Progress {
        let message = match status {
            PredictionStatus::Starting => {
                self.percent = 30;
                format!("Status: {status}")
            }
            PredictionStatus::Processing => {
                self.percent = (self.percent + 1).min(PROCESSING_CEILING);
                format!("Status: {status}")
            }
            PredictionStatus::Succeeded => {
                self.percent = 100;
                "Video generated successfully!".to_string()
            }
            PredictionStatus::Failed | PredictionStatus::Canceled => {
                self.percent = 0;
                "Generation failed".to_string()
            }
        };
        Progress::new(self.percent, message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVideo {
    pub id: String,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("{0}")]
    Failed(String),

    #[error("Prediction {0} succeeded but returned no output")]
    MissingOutput(String),

    #[error("Prediction did not finish after {0} status checks")]
    Exhausted(u32),

    #[error("Invalid poll configuration: {0}")]
    InvalidConfig(&'static str),
}

fn failure_message(prediction: &Prediction) -> String {
    prediction
        .error
        .clone()
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| "Failed to generate video".to_string())
}

/// Poll `id` every `config.interval` until it succeeds or fails.
///
/// The first check happens one interval after the call. Fetch errors end the
/// loop immediately.
pub async fn poll_until_complete<S, F>(
    source: &S,
    id: &str,
    config: &PollConfig,
    mut on_progress: F,
) -> Result<String, PollError>
where
    S: PredictionSource,
    F: FnMut(&Progress),
{
    config.validate()?;

    let mut tracker = ProgressTracker::new(20);
    let mut ticker = interval_at(Instant::now() + config.interval, config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut polls = 0u32;

    loop {
        ticker.tick().await;
        polls += 1;

        let prediction = match source.fetch(id).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(prediction_id = %id, error = %e, "Status check failed");
                on_progress(&Progress::new(0, "Error while checking status"));
                return Err(e.into());
            }
        };

        tracing::debug!(prediction_id = %id, status = %prediction.status, polls, "Polled prediction");
        on_progress(&tracker.observe(prediction.status));

        match prediction.status {
            PredictionStatus::Succeeded => {
                return prediction
                    .output
                    .ok_or_else(|| PollError::MissingOutput(id.to_string()));
            }
            PredictionStatus::Failed | PredictionStatus::Canceled => {
                return Err(PollError::Failed(failure_message(&prediction)));
            }
            PredictionStatus::Starting | PredictionStatus::Processing => {}
        }

        if config.max_polls.is_some_and(|max| polls >= max) {
            return Err(PollError::Exhausted(polls));
        }
    }
}

/// Submit a request and poll the resulting prediction to completion.
pub async fn run_generation<S, F>(
    source: &S,
    request: &GenerationRequest,
    config: &PollConfig,
    mut on_progress: F,
) -> Result<GeneratedVideo, PollError>
where
    S: PredictionSubmitter,
    F: FnMut(&Progress),
{
    config.validate()?;

    on_progress(&Progress::new(5, "Initializing..."));
    on_progress(&Progress::new(10, "Sending request to server..."));

    let prediction = match source.submit(request).await {
        Ok(p) => p,
        Err(e) => {
            on_progress(&Progress::new(0, "Error during generation"));
            return Err(e.into());
        }
    };

    if matches!(
        prediction.status,
        PredictionStatus::Failed | PredictionStatus::Canceled
    ) {
        on_progress(&Progress::new(0, "Error during generation"));
        return Err(PollError::Failed(failure_message(&prediction)));
    }

    tracing::info!(prediction_id = %prediction.id, status = %prediction.status, "Prediction accepted");
    on_progress(&Progress::new(20, "Generating video..."));

    let url = poll_until_complete(source, &prediction.id, config, on_progress).await?;
    Ok(GeneratedVideo {
        id: prediction.id,
        url,
    })
}
