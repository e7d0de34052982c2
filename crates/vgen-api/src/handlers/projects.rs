//! Project listing and deletion endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use vgen_models::Project;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
}

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ProjectListResponse>> {
    let projects = state.project_service.list(user.id).await?;
    Ok(Json(ProjectListResponse { projects }))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub status: String,
}

/// DELETE /api/projects/:project_id
///
/// Removes the stored artifacts and the project row. A project owned by
/// another user answers 404, same as a missing one.
pub async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    state.project_service.delete(project_id, user.id).await?;
    Ok(Json(DeleteResponse {
        status: "deleted".to_string(),
    }))
}
