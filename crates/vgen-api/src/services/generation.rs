//! Image-to-video generation pipeline.
//!
//! One request is a single blocking pipeline: gate the quota, persist the
//! input image, drive the external job to completion, persist the output
//! video, then record the project and consume one unit of quota. Failures
//! before the video is stored abort the request; the two bookkeeping
//! writes at the tail are best-effort, the user already has their video.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use vgen_db::ProjectStore;
use vgen_models::Project;
use vgen_sora::{GenerationParams, ImageInput, SoraClient};
use vgen_storage::{keys, ObjectStore};

use crate::error::ApiResult;
use crate::services::EntitlementService;

/// Appended to every prompt to bias the model toward motion. Without it
/// the model tends to render near-static clips from a single input frame.
const MOTION_PROMPT_SUFFIX: &str = "Fast-paced dynamic motion, quick movements, \
     energetic animation, rapid action, high-speed camera movements, dynamic \
     transitions.";

/// Lifetime of signed URLs handed back when the bucket has no public base.
const SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// An image received from the client, ready for upload and submission.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Result of a completed generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub project_id: Option<Uuid>,
    pub input_image_url: String,
    pub output_video_url: String,
}

/// Orchestrates one generation end to end.
#[derive(Clone)]
pub struct GenerationService {
    entitlements: EntitlementService,
    projects: Arc<dyn ProjectStore>,
    storage: Arc<dyn ObjectStore>,
    sora: SoraClient,
}

impl GenerationService {
    pub fn new(
        entitlements: EntitlementService,
        projects: Arc<dyn ProjectStore>,
        storage: Arc<dyn ObjectStore>,
        sora: SoraClient,
    ) -> Self {
        Self {
            entitlements,
            projects,
            storage,
            sora,
        }
    }

    /// Run the full pipeline for one request.
    pub async fn generate(
        &self,
        user_id: Uuid,
        prompt: &str,
        image: UploadedImage,
    ) -> ApiResult<GenerationOutcome> {
        // Quota gate runs before any upload or external call.
        self.entitlements.ensure_can_generate(user_id).await?;

        let extension = file_extension(&image.file_name);
        let input_key = keys::input_image_key(user_id, extension);
        self.storage
            .upload_bytes(&input_key, image.bytes.clone(), &image.content_type)
            .await?;
        let input_image_url = self.stored_url(&input_key).await?;
        info!(user_id = %user_id, key = %input_key, "Stored input image");

        let params = GenerationParams::new(enhance_prompt(prompt)).with_image(ImageInput {
            bytes: image.bytes,
            content_type: image.content_type,
            file_name: base_name(&input_key).to_string(),
        });
        let asset_url = self.sora.generate(params).await?;

        let video_bytes = self.sora.download_asset(&asset_url).await?;
        let output_key = keys::output_video_key(user_id);
        self.storage
            .upload_bytes(&output_key, video_bytes, "video/mp4")
            .await?;
        let output_video_url = self.stored_url(&output_key).await?;
        info!(user_id = %user_id, key = %output_key, "Stored generated video");

        // From here on the video exists and is reachable. Record-keeping
        // failures are logged, not surfaced.
        let project = Project::completed(user_id, prompt, &input_image_url, &output_video_url);
        let project_id = match self.projects.insert(&project).await {
            Ok(()) => Some(project.id),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to record project");
                None
            }
        };

        match self.entitlements.increment_usage(user_id).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(user_id = %user_id, "Usage increment matched no quota to consume")
            }
            Err(e) => warn!(user_id = %user_id, error = %e, "Failed to increment usage"),
        }

        Ok(GenerationOutcome {
            project_id,
            input_image_url,
            output_video_url,
        })
    }

    /// Public URL when the bucket has one, otherwise a signed URL.
    async fn stored_url(&self, key: &str) -> ApiResult<String> {
        match self.storage.public_url(key) {
            Some(url) => Ok(url),
            None => Ok(self.storage.presign_get(key, SIGNED_URL_TTL).await?),
        }
    }
}

/// Trimmed prompt with the motion suffix appended.
fn enhance_prompt(prompt: &str) -> String {
    format!("{}. {}", prompt.trim().trim_end_matches('.'), MOTION_PROMPT_SUFFIX)
}

fn file_extension(file_name: &str) -> &str {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or("png")
}

fn base_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
