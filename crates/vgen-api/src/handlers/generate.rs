//! Generation endpoint.

use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::Json;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::services::{GenerationOutcome, UploadedImage};
use crate::state::AppState;

const MAX_PROMPT_CHARS: usize = 2000;

/// Fields parsed from the multipart body.
struct GenerateRequest {
    prompt: String,
    image: UploadedImage,
}

async fn parse_request(mut multipart: Multipart) -> ApiResult<GenerateRequest> {
    let mut prompt: Option<String> = None;
    let mut image: Option<UploadedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("prompt") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid prompt field: {}", e)))?;
                prompt = Some(text);
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("image.png").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid image field: {}", e)))?;
                image = Some(UploadedImage {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    let prompt = prompt
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing prompt"))?;
    if prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(ApiError::bad_request("Prompt too long"));
    }

    let image = image.ok_or_else(|| ApiError::bad_request("Missing image file"))?;
    if image.bytes.is_empty() {
        return Err(ApiError::bad_request("Empty image upload"));
    }
    if !image.content_type.starts_with("image/") {
        return Err(ApiError::bad_request("Upload must be an image"));
    }

    Ok(GenerateRequest { prompt, image })
}

/// POST /api/generate
///
/// Multipart body with a `prompt` text field and a `file` image field.
/// Blocks until the external job finishes; the response carries the
/// stored artifact URLs.
pub async fn generate(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> ApiResult<Json<GenerationOutcome>> {
    let request = parse_request(multipart).await?;
    info!(user_id = %user.id, prompt_len = request.prompt.len(), "Generation requested");

    let start = Instant::now();
    let result = state
        .generation_service
        .generate(user.id, &request.prompt, request.image)
        .await;
    let duration = start.elapsed().as_secs_f64();

    match result {
        Ok(outcome) => {
            metrics::record_generation("success", duration);
            Ok(Json(outcome))
        }
        Err(e) => {
            let outcome = match &e {
                ApiError::QuotaExhausted { .. } => "quota_exhausted",
                ApiError::Generation(vgen_sora::SoraError::JobFailed { .. }) => "job_failed",
                ApiError::Generation(vgen_sora::SoraError::Timeout { .. }) => "timeout",
                _ => "error",
            };
            metrics::record_generation(outcome, duration);
            Err(e)
        }
    }
}
