use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{resolve, Access, AccessClass, Authorized, AuthzError, Own};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::project::{
    Project, ProjectCreateRequest, ProjectDetail, ProjectUpdateRequest, DEFAULT_PROJECT_STATUS,
};
use crate::payload::Payload;
use crate::response::ApiResponse;
use crate::store::projects::{self, NewProject, ProjectChanges};
use crate::utils::{non_blank, nullable_text};

#[utoipa::path(
    get,
    path = "/api/v1/projects",
    tag = "Projects",
    responses(
        (status = 200, description = "Projects visible to the caller, newest first", body = [Project]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_projects(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<ApiResponse<Vec<Project>>>> {
    // Platform admins see every project, everyone else only their memberships
    let projects = match resolve(&state.pool, auth.user_id, None, AccessClass::PlatformAdmin).await {
        Ok(_) => projects::list_all(&state.pool).await?,
        Err(AuthzError::InsufficientPrivilege(_)) => projects::list_for_member(&state.pool, auth.user_id).await?,
        Err(err) => return Err(err.into()),
    };

    Ok(ApiResponse::list(projects))
}

#[utoipa::path(
    post,
    path = "/api/v1/projects",
    tag = "Projects",
    request_body = ProjectCreateRequest,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Project name is required")
    )
)]
pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Payload(payload): Payload<ProjectCreateRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Project>>)> {
    let name = non_blank(payload.name.as_deref()).ok_or_else(|| AppError::bad_request("Project name is required"))?;

    let new = NewProject {
        name,
        description: non_blank(payload.description.as_deref()),
        status: non_blank(payload.status.as_deref()).unwrap_or_else(|| DEFAULT_PROJECT_STATUS.to_string()),
        created_by: auth.user_id,
        start_date: payload.start_date,
        target_end_date: payload.target_end_date,
    };

    let project = projects::insert(&state.pool, new, state.config.auto_enroll_project_creator).await?;
    tracing::info!(project_id = %project.id, user_id = %auth.user_id, "project created");

    Ok(ApiResponse::created(project, "Project created successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}",
    tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project detail with the caller's roles", body = ProjectDetail),
        (status = 403, description = "Not a member"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn get_project(State(state): State<AppState>, authz: Authorized<Access>) -> AppResult<Json<ApiResponse<ProjectDetail>>> {
    let project = fetch_project(&state, authz.project_id).await?;

    Ok(ApiResponse::ok(ProjectDetail {
        project,
        access: authz.grant,
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/projects/{project_id}",
    tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project id")),
    request_body = ProjectUpdateRequest,
    responses(
        (status = 200, description = "Project updated", body = Project),
        (status = 400, description = "No valid fields to update"),
        (status = 403, description = "Owner or project admin required"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn update_project(
    State(state): State<AppState>,
    authz: Authorized<Own>,
    Payload(payload): Payload<ProjectUpdateRequest>,
) -> AppResult<Json<ApiResponse<Project>>> {
    let changes = ProjectChanges {
        name: non_blank(payload.name.as_deref()),
        description: nullable_text(payload.description),
        status: non_blank(payload.status.as_deref()),
        start_date: payload.start_date,
        target_end_date: payload.target_end_date,
        actual_end_date: payload.actual_end_date,
    };

    if changes.is_empty() {
        return Err(AppError::bad_request("No valid fields to update"));
    }

    let project = projects::update(&state.pool, authz.project_id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Project not found"))?;

    Ok(ApiResponse::ok_with_message(project, "Project updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/projects/{project_id}",
    tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project and its members, tasks and notes deleted"),
        (status = 403, description = "Owner or project admin required"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn delete_project(State(state): State<AppState>, authz: Authorized<Own>) -> AppResult<Json<ApiResponse<()>>> {
    if projects::delete(&state.pool, authz.project_id).await? == 0 {
        return Err(AppError::not_found("Project not found"));
    }

    tracing::info!(project_id = %authz.project_id, user_id = %authz.user.user_id, "project deleted");
    Ok(ApiResponse::message("Project deleted successfully"))
}

pub(crate) async fn fetch_project(state: &AppState, project_id: Uuid) -> AppResult<Project> {
    projects::find(&state.pool, project_id)
        .await?
        .ok_or_else(|| AppError::not_found("Project not found"))
}

pub(crate) async fn ensure_project(state: &AppState, project_id: Uuid) -> AppResult<()> {
    if projects::exists(&state.pool, project_id).await? {
        Ok(())
    } else {
        Err(AppError::not_found("Project not found"))
    }
}
