//! Project listing and deletion.
//!
//! Deletion removes both stored artifacts and the database row. Storage
//! deletes run first and tolerate failure; the row delete is the
//! authoritative step. Ownership is enforced by querying with the user
//! id, and a foreign project answers exactly like a missing one.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use vgen_db::ProjectStore;
use vgen_models::Project;
use vgen_storage::ObjectStore;

use crate::error::{ApiError, ApiResult};

const NOT_FOUND_MESSAGE: &str = "Project not found or access denied";

#[derive(Clone)]
pub struct ProjectService {
    projects: Arc<dyn ProjectStore>,
    storage: Arc<dyn ObjectStore>,
}

impl ProjectService {
    pub fn new(projects: Arc<dyn ProjectStore>, storage: Arc<dyn ObjectStore>) -> Self {
        Self { projects, storage }
    }

    /// List a user's projects, newest first.
    pub async fn list(&self, user_id: Uuid) -> ApiResult<Vec<Project>> {
        Ok(self.projects.list_for_user(user_id).await?)
    }

    /// Delete a project's artifacts and row.
    pub async fn delete(&self, project_id: Uuid, user_id: Uuid) -> ApiResult<()> {
        let project = self
            .projects
            .find_for_user(project_id, user_id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND_MESSAGE))?;

        for url in [&project.input_image_url, &project.output_video_url] {
            match self.storage.key_from_url(url) {
                Some(key) => {
                    if let Err(e) = self.storage.delete_object(&key).await {
                        warn!(project_id = %project_id, key = %key, error = %e,
                            "Failed to delete stored artifact, continuing");
                    }
                }
                None => {
                    warn!(project_id = %project_id, url = %url,
                        "Could not derive object key from stored URL");
                }
            }
        }

        let deleted = self.projects.delete_for_user(project_id, user_id).await?;
        if !deleted {
            // Row vanished between lookup and delete.
            return Err(ApiError::not_found(NOT_FOUND_MESSAGE));
        }

        info!(project_id = %project_id, user_id = %user_id, "Deleted project");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_store::{MemoryObjectStore, MemoryProjectStore};

    fn service(
        projects: Arc<MemoryProjectStore>,
        storage: Arc<MemoryObjectStore>,
    ) -> ProjectService {
        ProjectService::new(projects, storage)
    }

    async fn seeded_project(
        projects: &MemoryProjectStore,
        storage: &MemoryObjectStore,
        user_id: Uuid,
    ) -> Project {
        let input_key = format!("inputs/{}/a.png", user_id);
        let output_key = format!("outputs/{}/b.mp4", user_id);
        storage
            .upload_bytes(&input_key, vec![1], "image/png")
            .await
            .unwrap();
        storage
            .upload_bytes(&output_key, vec![2], "video/mp4")
            .await
            .unwrap();

        let project = Project::completed(
            user_id,
            "a prompt",
            storage.public_url(&input_key).unwrap(),
            storage.public_url(&output_key).unwrap(),
        );
        projects.seed(project.clone());
        project
    }

    #[tokio::test]
    async fn delete_removes_both_artifacts_and_the_row() {
        let projects = Arc::new(MemoryProjectStore::default());
        let storage = Arc::new(MemoryObjectStore::default());
        let user = Uuid::new_v4();
        let project = seeded_project(&projects, &storage, user).await;

        service(projects.clone(), storage.clone())
            .delete(project.id, user)
            .await
            .unwrap();

        assert_eq!(projects.row_count(), 0);
        assert_eq!(storage.object_count(), 0);
        assert_eq!(storage.deleted_keys().len(), 2);
    }

    #[tokio::test]
    async fn failed_artifact_delete_still_removes_the_row() {
        let projects = Arc::new(MemoryProjectStore::default());
        let storage = Arc::new(MemoryObjectStore::default());
        let user = Uuid::new_v4();
        let project = seeded_project(&projects, &storage, user).await;
        storage.fail_deletes();

        service(projects.clone(), storage.clone())
            .delete(project.id, user)
            .await
            .unwrap();

        // Row is gone even though neither artifact could be removed.
        assert_eq!(projects.row_count(), 0);
        assert_eq!(storage.object_count(), 2);
        assert!(storage.deleted_keys().is_empty());
    }

    #[tokio::test]
    async fn foreign_project_reads_as_missing() {
        let projects = Arc::new(MemoryProjectStore::default());
        let storage = Arc::new(MemoryObjectStore::default());
        let owner = Uuid::new_v4();
        let project = seeded_project(&projects, &storage, owner).await;

        let err = service(projects.clone(), storage.clone())
            .delete(project.id, Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(projects.row_count(), 1);
        assert_eq!(storage.object_count(), 2);
    }

    #[tokio::test]
    async fn missing_project_is_not_found() {
        let projects = Arc::new(MemoryProjectStore::default());
        let storage = Arc::new(MemoryObjectStore::default());

        let err = service(projects, storage)
            .delete(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn underivable_artifact_url_still_deletes_the_row() {
        let projects = Arc::new(MemoryProjectStore::default());
        let storage = Arc::new(MemoryObjectStore::default());
        let user = Uuid::new_v4();

        let project = Project::completed(
            user,
            "a prompt",
            "https://elsewhere.example/not-ours.png",
            "https://elsewhere.example/not-ours.mp4",
        );
        projects.seed(project.clone());

        service(projects.clone(), storage.clone())
            .delete(project.id, user)
            .await
            .unwrap();

        assert_eq!(projects.row_count(), 0);
        assert!(storage.deleted_keys().is_empty());
    }

    #[tokio::test]
    async fn list_returns_newest_first_for_owner_only() {
        let projects = Arc::new(MemoryProjectStore::default());
        let storage = Arc::new(MemoryObjectStore::default());
        let user = Uuid::new_v4();

        seeded_project(&projects, &storage, user).await;
        seeded_project(&projects, &storage, user).await;
        seeded_project(&projects, &storage, Uuid::new_v4()).await;

        let listed = service(projects, storage).list(user).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at >= listed[1].created_at);
    }
}
