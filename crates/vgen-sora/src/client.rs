//! Sora client implementation.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use tracing::{debug, info, warn};

use crate::error::{SoraError, SoraResult};
use crate::failure::failure_reason_message;
use crate::response::JobResponse;
use crate::response::JobState;

/// Header carrying the static API key on every request.
const API_KEY_HEADER: &str = "Api-key";

/// Configuration for the Sora client.
///
/// Poll interval, attempt cap, and settle delay are empirical tuning
/// values, kept configurable rather than hard-coded.
#[derive(Debug, Clone)]
pub struct SoraConfig {
    /// Jobs endpoint, e.g.
    /// `https://{resource}.openai.azure.com/openai/v1/video/generations/jobs`.
    /// A query string, if present, is stripped.
    pub endpoint: String,
    /// Static API key.
    pub api_key: String,
    /// API version marker appended to every request.
    pub api_version: String,
    /// Model identifier submitted with every job.
    pub model: String,
    /// Delay between status polls.
    pub poll_interval: Duration,
    /// Maximum number of status polls before declaring a timeout.
    pub poll_max_attempts: u32,
    /// Delay after `succeeded` before resolving the asset, absorbing
    /// provider-side eventual availability of the rendered file.
    pub settle_delay: Duration,
    /// Per-request timeout on the underlying HTTP client.
    pub request_timeout: Duration,
}

impl Default for SoraConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            api_version: "preview".to_string(),
            model: "sora".to_string(),
            poll_interval: Duration::from_secs(2),
            poll_max_attempts: 60,
            settle_delay: Duration::from_secs(5),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl SoraConfig {
    /// Create config from environment variables.
    pub fn from_env() -> SoraResult<Self> {
        let endpoint = std::env::var("SORA_ENDPOINT")
            .map_err(|_| SoraError::Parse("SORA_ENDPOINT not set".to_string()))?;
        let api_key = std::env::var("SORA_API_KEY")
            .map_err(|_| SoraError::Parse("SORA_API_KEY not set".to_string()))?;

        let defaults = Self::default();
        Ok(Self {
            endpoint,
            api_key,
            api_version: std::env::var("SORA_API_VERSION")
                .unwrap_or(defaults.api_version),
            model: std::env::var("SORA_MODEL").unwrap_or(defaults.model),
            poll_interval: env_secs("SORA_POLL_INTERVAL_SECS", defaults.poll_interval),
            poll_max_attempts: std::env::var("SORA_POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.poll_max_attempts),
            settle_delay: env_secs("SORA_SETTLE_DELAY_SECS", defaults.settle_delay),
            request_timeout: env_secs("SORA_REQUEST_TIMEOUT_SECS", defaults.request_timeout),
        })
    }
}

fn env_secs(var: &str, default: Duration) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

/// Image payload for an image-conditioned job.
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub content_type: String,
    /// File name referenced by the inpaint-items descriptor. Just the
    /// base name, without any user namespace.
    pub file_name: String,
}

/// Parameters for one generation job.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub prompt: String,
    pub height: u32,
    pub width: u32,
    pub n_seconds: u32,
    pub n_variants: u32,
    pub image: Option<ImageInput>,
}

impl GenerationParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            height: 1080,
            width: 1080,
            n_seconds: 2,
            n_variants: 1,
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = Some(image);
        self
    }
}

/// Client for the Sora video-generation service.
///
/// One `generate` call is a single logical blocking operation: it submits
/// the job, polls it to a terminal state, and resolves the asset URL.
/// Concurrent calls share nothing but the HTTP connection pool.
#[derive(Clone)]
pub struct SoraClient {
    http: reqwest::Client,
    config: SoraConfig,
}

impl SoraClient {
    /// Create a new client from configuration.
    pub fn new(mut config: SoraConfig) -> SoraResult<Self> {
        // Tolerate an endpoint that already carries the api-version query.
        let stripped = config
            .endpoint
            .split('?')
            .next()
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string();
        config.endpoint = stripped;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> SoraResult<Self> {
        Self::new(SoraConfig::from_env()?)
    }

    /// API key used for submissions; asset downloads require the same
    /// credential.
    pub fn api_key(&self) -> &str {
        &self.config.api_key
    }

    fn jobs_url(&self) -> String {
        format!(
            "{}?api-version={}",
            self.config.endpoint, self.config.api_version
        )
    }

    fn job_status_url(&self, job_id: &str) -> String {
        format!(
            "{}/{}?api-version={}",
            self.config.endpoint, job_id, self.config.api_version
        )
    }

    /// API base above `/video/generations/jobs`, used to synthesize
    /// content-fetch URLs.
    fn base_url(&self) -> String {
        self.config
            .endpoint
            .trim_end_matches('/')
            .trim_end_matches("/video/generations/jobs")
            .to_string()
    }

    /// Submit a job and drive it to completion. Returns the resolved
    /// asset URL.
    pub async fn generate(&self, params: GenerationParams) -> SoraResult<String> {
        let job_id = self.submit(params).await?;
        info!(job_id = %job_id, "Sora job created");

        let response = self.poll_to_terminal(&job_id).await?;

        // The rendered file can lag the succeeded status by a few seconds.
        if !self.config.settle_delay.is_zero() {
            tokio::time::sleep(self.config.settle_delay).await;
        }

        response
            .resolve_asset_url(&self.base_url(), &self.config.api_version)
            .ok_or(SoraError::MissingAssetUrl)
    }

    /// Submit a generation job. Image-conditioned jobs go out as
    /// multipart with an inpaint-items descriptor anchoring the image at
    /// frame 0 over the full frame; text-only jobs are plain JSON.
    pub async fn submit(&self, params: GenerationParams) -> SoraResult<String> {
        let request = self.http.post(self.jobs_url());

        let response = match params.image {
            Some(image) => {
                debug!("Submitting image-conditioned job (multipart)");
                let inpaint_items = serde_json::json!([{
                    "frame_index": 0,
                    "type": "image",
                    "file_name": image.file_name,
                    "crop_bounds": {
                        "left_fraction": 0.0,
                        "top_fraction": 0.0,
                        "right_fraction": 1.0,
                        "bottom_fraction": 1.0,
                    },
                }]);

                let file_part = Part::bytes(image.bytes)
                    .file_name(image.file_name.clone())
                    .mime_str(&image.content_type)?;

                let form = Form::new()
                    .text("prompt", params.prompt)
                    .text("height", params.height.to_string())
                    .text("width", params.width.to_string())
                    .text("n_seconds", params.n_seconds.to_string())
                    .text("n_variants", params.n_variants.to_string())
                    .text("model", self.config.model.clone())
                    .text("inpaint_items", inpaint_items.to_string())
                    .part("files", file_part);

                request
                    .header(API_KEY_HEADER, &self.config.api_key)
                    .multipart(form)
                    .send()
                    .await?
            }
            None => {
                debug!("Submitting text-only job (JSON)");
                request
                    .header(API_KEY_HEADER, &self.config.api_key)
                    .json(&serde_json::json!({
                        "model": self.config.model,
                        "prompt": params.prompt,
                        "height": params.height,
                        "width": params.width,
                        "n_seconds": params.n_seconds,
                        "n_variants": params.n_variants,
                    }))
                    .send()
                    .await?
            }
        };

        let job = self.parse_job_response(response).await?;
        job.id.ok_or(SoraError::MissingJobId)
    }

    /// Poll the job until it reaches a terminal state. `failed` maps the
    /// upstream reason code to a readable message; unrecognized statuses
    /// keep the loop going.
    pub async fn poll_to_terminal(&self, job_id: &str) -> SoraResult<JobResponse> {
        let url = self.job_status_url(job_id);

        for attempt in 0..self.config.poll_max_attempts {
            let response = self
                .http
                .get(&url)
                .header(API_KEY_HEADER, &self.config.api_key)
                .send()
                .await?;

            let job = self.parse_job_response(response).await?;
            debug!(
                job_id = %job_id,
                attempt = attempt + 1,
                status = job.status.as_deref().unwrap_or("<none>"),
                "Polled job status"
            );

            match job.state() {
                JobState::Succeeded => return Ok(job),
                JobState::Failed => {
                    let reason = job
                        .failure_reason
                        .unwrap_or_else(|| "unknown".to_string());
                    let message = failure_reason_message(&reason);
                    warn!(job_id = %job_id, reason = %reason, "Sora job failed");
                    return Err(SoraError::JobFailed { reason, message });
                }
                JobState::InProgress => {
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }

        Err(SoraError::Timeout {
            attempts: self.config.poll_max_attempts,
            seconds: self.config.poll_max_attempts as u64 * self.config.poll_interval.as_secs(),
        })
    }

    /// Download the generated asset with the submission credential.
    pub async fn download_asset(&self, url: &str) -> SoraResult<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SoraError::AssetDownload {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        debug!(size = bytes.len(), "Downloaded generated asset");
        Ok(bytes.to_vec())
    }

    /// Read a job response, mapping non-2xx statuses to an API error
    /// that keeps whatever message the service produced.
    async fn parse_job_response(&self, response: reqwest::Response) -> SoraResult<JobResponse> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<JobResponse>(&text)
                .ok()
                .and_then(|j| j.error.and_then(|e| e.message))
                .unwrap_or_else(|| {
                    if text.is_empty() {
                        status.to_string()
                    } else {
                        text.clone()
                    }
                });
            return Err(SoraError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|_| SoraError::Parse(text))
    }
}
