//! Project records for completed generations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Project status. Rows are only written once the external job has
/// succeeded and the video is stored, so `completed` is the only state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Completed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One completed generation: the prompt, the stored input image, and the
/// stored output video.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt: String,
    pub input_image_url: String,
    pub output_video_url: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Build a completed project record.
    pub fn completed(
        user_id: Uuid,
        prompt: impl Into<String>,
        input_image_url: impl Into<String>,
        output_video_url: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            prompt: prompt.into(),
            input_image_url: input_image_url.into(),
            output_video_url: output_video_url.into(),
            status: ProjectStatus::Completed.as_str().to_string(),
            created_at: Utc::now(),
        }
    }
}
