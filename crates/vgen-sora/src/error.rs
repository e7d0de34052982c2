//! Sora client error types.

use thiserror::Error;

/// Result type for Sora operations.
pub type SoraResult<T> = Result<T, SoraError>;

/// Failure reason code for images containing human faces. Callers surface
/// a distinct remediation message for this case.
pub const REASON_FACE_UPLOAD_NOT_ALLOWED: &str = "face_upload_not_allowed";

/// Errors that can occur while driving a generation job.
#[derive(Debug, Error)]
pub enum SoraError {
    /// The service rejected a request outright (submission or poll).
    #[error("Sora API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The submission response carried no job id, so there is nothing to
    /// poll.
    #[error("No job id returned from the generation service")]
    MissingJobId,

    /// The job reached `failed`. Terminal, never retried.
    #[error("Video generation failed: {message}")]
    JobFailed { reason: String, message: String },

    /// The polling attempt cap was exhausted without a terminal status.
    #[error("Video generation timed out - job took too long ({seconds} seconds)")]
    Timeout { attempts: u32, seconds: u64 },

    /// The job succeeded but no strategy could discover an asset URL.
    #[error("Job succeeded but no video URL was found in the response")]
    MissingAssetUrl,

    /// Downloading the generated asset failed.
    #[error("Failed to download generated video ({status}): {message}")]
    AssetDownload { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse Sora response: {0}")]
    Parse(String),
}

impl SoraError {
    /// Whether this is the disallowed-face-content rejection.
    pub fn is_face_rejection(&self) -> bool {
        matches!(self, SoraError::JobFailed { reason, .. } if reason == REASON_FACE_UPLOAD_NOT_ALLOWED)
    }
}
