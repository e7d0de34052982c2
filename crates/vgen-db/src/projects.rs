//! Project repository.
//!
//! Rows are always read and deleted filtered by both project id and
//! owning user id, so a foreign project is indistinguishable from a
//! missing one.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use vgen_models::Project;

use crate::error::DbResult;

/// Data access over project rows.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Insert a completed project record.
    async fn insert(&self, project: &Project) -> DbResult<()>;

    /// Fetch a project owned by the given user.
    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> DbResult<Option<Project>>;

    /// Delete a project owned by the given user. Returns false when no
    /// row matched.
    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> DbResult<bool>;

    /// List a user's projects, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<Project>>;
}

/// Live Postgres implementation.
pub struct PgProjectStore {
    pool: PgPool,
}

impl PgProjectStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for PgProjectStore {
    async fn insert(&self, project: &Project) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO projects (id, user_id, prompt, input_image_url, output_video_url, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(project.id)
        .bind(project.user_id)
        .bind(&project.prompt)
        .bind(&project.input_image_url)
        .bind(&project.output_video_url)
        .bind(&project.status)
        .bind(project.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> DbResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }
}
