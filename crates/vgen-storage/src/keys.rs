//! Object key conventions.
//!
//! Artifacts are namespaced per user and per random identifier, so
//! concurrent requests never contend on a key:
//!
//! - input images:  `inputs/{user_id}/{uuid}.{ext}`
//! - output videos: `outputs/{user_id}/{uuid}.mp4`

use url::Url;
use uuid::Uuid;

/// Key prefix for uploaded input images.
pub const INPUT_PREFIX: &str = "inputs";

/// Key prefix for generated output videos.
pub const OUTPUT_PREFIX: &str = "outputs";

/// Build a fresh key for an uploaded input image, preserving the original
/// file extension.
pub fn input_image_key(user_id: Uuid, extension: &str) -> String {
    let ext = extension.trim_start_matches('.');
    if ext.is_empty() {
        format!("{}/{}/{}", INPUT_PREFIX, user_id, Uuid::new_v4())
    } else {
        format!("{}/{}/{}.{}", INPUT_PREFIX, user_id, Uuid::new_v4(), ext)
    }
}

/// Build a fresh key for a generated output video.
pub fn output_video_key(user_id: Uuid) -> String {
    format!("{}/{}/{}.mp4", OUTPUT_PREFIX, user_id, Uuid::new_v4())
}

/// Recover the object key from a URL we previously handed out.
///
/// Stored URLs are either `{public_base}/{key}` or a presigned URL whose
/// path is `/{bucket}/{key}` (path-style addressing). Returns None when
/// the URL matches neither shape.
pub fn key_from_url(url: &str, public_base: Option<&str>, bucket: &str) -> Option<String> {
    if let Some(base) = public_base {
        let base = base.trim_end_matches('/');
        if let Some(rest) = url.strip_prefix(base) {
            let key = rest.trim_start_matches('/');
            if !key.is_empty() {
                return Some(key.to_string());
            }
        }
    }

    let parsed = Url::parse(url).ok()?;
    let path = parsed.path().trim_start_matches('/');
    let key = path.strip_prefix(bucket)?.trim_start_matches('/');
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}
