//! Sora job response parsing and asset URL resolution.
//!
//! The response schema is not contractually fixed: depending on the API
//! build, the asset URL has been observed in four different places. Each
//! place is a small pure strategy, tried in a fixed order, and the first
//! one that yields a non-empty URL wins.

use serde::Deserialize;

/// Job response as returned by create and poll calls. Every field is
/// optional on purpose.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobResponse {
    pub id: Option<String>,
    pub status: Option<String>,
    pub failure_reason: Option<String>,
    pub generations: Option<Vec<GenerationEntry>>,
    pub result: Option<ResultEnvelope>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationEntry {
    pub id: Option<String>,
    pub url: Option<String>,
    pub content: Option<Vec<ContentEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentEntry {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultEnvelope {
    pub data: Option<Vec<ContentEntry>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    pub message: Option<String>,
    pub code: Option<String>,
}

/// Coarse job state derived from the status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// `succeeded` - terminal success.
    Succeeded,
    /// `failed` - terminal failure.
    Failed,
    /// `pending`, `preprocessing`, `running`, or anything unrecognized.
    InProgress,
}

impl JobState {
    /// Classify a status string. Unrecognized values are treated as
    /// still-in-progress and polled again.
    pub fn from_status(status: Option<&str>) -> Self {
        match status {
            Some("succeeded") => JobState::Succeeded,
            Some("failed") => JobState::Failed,
            _ => JobState::InProgress,
        }
    }
}

impl JobResponse {
    pub fn state(&self) -> JobState {
        JobState::from_status(self.status.as_deref())
    }

    fn first_generation(&self) -> Option<&GenerationEntry> {
        self.generations.as_ref()?.first()
    }

    /// Strategy 1: `generations[0].url`.
    fn direct_url(&self) -> Option<String> {
        non_empty(self.first_generation()?.url.clone())
    }

    /// Strategy 2: `generations[0].content[0].url`.
    fn nested_content_url(&self) -> Option<String> {
        non_empty(
            self.first_generation()?
                .content
                .as_ref()?
                .first()?
                .url
                .clone(),
        )
    }

    /// Strategy 3: `result.data[0].url` (standard OpenAI shape).
    fn result_data_url(&self) -> Option<String> {
        non_empty(self.result.as_ref()?.data.as_ref()?.first()?.url.clone())
    }

    /// Strategy 4: only a generation id is present; the content URL must
    /// be synthesized from it.
    fn generation_id(&self) -> Option<String> {
        non_empty(self.first_generation()?.id.clone())
    }

    /// Resolve the final asset URL. `base_url` is the API base above
    /// `/video/generations/jobs`.
    pub fn resolve_asset_url(&self, base_url: &str, api_version: &str) -> Option<String> {
        self.direct_url()
            .or_else(|| self.nested_content_url())
            .or_else(|| self.result_data_url())
            .or_else(|| {
                self.generation_id()
                    .map(|id| generation_content_url(base_url, &id, api_version))
            })
    }
}

/// Content-fetch URL for a generation id, per the documented path
/// `/video/generations/{generation_id}/content/video`.
pub fn generation_content_url(base_url: &str, generation_id: &str, api_version: &str) -> String {
    format!(
        "{}/video/generations/{}/content/video?api-version={}",
        base_url.trim_end_matches('/'),
        generation_id,
        api_version
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> JobResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn unrecognized_status_is_in_progress() {
        assert_eq!(JobState::from_status(Some("queued_v2")), JobState::InProgress);
        assert_eq!(JobState::from_status(None), JobState::InProgress);
        assert_eq!(JobState::from_status(Some("pending")), JobState::InProgress);
        assert_eq!(JobState::from_status(Some("preprocessing")), JobState::InProgress);
        assert_eq!(JobState::from_status(Some("running")), JobState::InProgress);
        assert_eq!(JobState::from_status(Some("succeeded")), JobState::Succeeded);
        assert_eq!(JobState::from_status(Some("failed")), JobState::Failed);
    }

    #[test]
    fn direct_url_wins_over_result_data() {
        let resp = parse(serde_json::json!({
            "status": "succeeded",
            "generations": [{"url": "https://cdn.example/direct.mp4"}],
            "result": {"data": [{"url": "https://cdn.example/result.mp4"}]}
        }));
        assert_eq!(
            resp.resolve_asset_url("https://api.example/openai/v1", "preview"),
            Some("https://cdn.example/direct.mp4".to_string())
        );
    }

    #[test]
    fn nested_content_url_is_second() {
        let resp = parse(serde_json::json!({
            "generations": [{"content": [{"url": "https://cdn.example/nested.mp4"}]}],
            "result": {"data": [{"url": "https://cdn.example/result.mp4"}]}
        }));
        assert_eq!(
            resp.resolve_asset_url("https://api.example", "preview"),
            Some("https://cdn.example/nested.mp4".to_string())
        );
    }

    #[test]
    fn result_data_url_is_third() {
        let resp = parse(serde_json::json!({
            "result": {"data": [{"url": "https://cdn.example/result.mp4"}]}
        }));
        assert_eq!(
            resp.resolve_asset_url("https://api.example", "preview"),
            Some("https://cdn.example/result.mp4".to_string())
        );
    }

    #[test]
    fn generation_id_synthesizes_content_url() {
        let resp = parse(serde_json::json!({
            "generations": [{"id": "gen-42"}]
        }));
        assert_eq!(
            resp.resolve_asset_url("https://api.example/openai/v1/", "preview"),
            Some(
                "https://api.example/openai/v1/video/generations/gen-42/content/video?api-version=preview"
                    .to_string()
            )
        );
    }

    #[test]
    fn empty_urls_are_skipped() {
        let resp = parse(serde_json::json!({
            "generations": [{"url": "", "content": [{"url": ""}]}],
            "result": {"data": [{"url": "https://cdn.example/only.mp4"}]}
        }));
        assert_eq!(
            resp.resolve_asset_url("https://api.example", "preview"),
            Some("https://cdn.example/only.mp4".to_string())
        );
    }

    #[test]
    fn no_strategy_yields_none() {
        let resp = parse(serde_json::json!({"status": "succeeded"}));
        assert_eq!(resp.resolve_asset_url("https://api.example", "preview"), None);
    }
}
