use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{parse_id, Access, Authorized, Own, ProjectRole};
use crate::errors::{AppError, AppResult};
use crate::models::member::{AddMemberRequest, ProjectMember, UpdateMemberRequest};
use crate::payload::Payload;
use crate::response::ApiResponse;
use crate::routes::projects::ensure_project;
use crate::store::{members, users};

const NOT_A_MEMBER: &str = "The specified user is not a member of this project";

#[utoipa::path(
    get,
    path = "/api/v1/projects/{project_id}/members",
    tag = "Members",
    params(("project_id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Members in the order they were added", body = [ProjectMember]),
        (status = 403, description = "Not a member")
    )
)]
pub async fn list_members(
    State(state): State<AppState>,
    authz: Authorized<Access>,
) -> AppResult<Json<ApiResponse<Vec<ProjectMember>>>> {
    let members = members::list(&state.pool, authz.project_id).await?;
    Ok(ApiResponse::list(members))
}

#[utoipa::path(
    post,
    path = "/api/v1/projects/{project_id}/members",
    tag = "Members",
    params(("project_id" = Uuid, Path, description = "Project id")),
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Member added", body = ProjectMember),
        (status = 400, description = "Missing user id or invalid role"),
        (status = 403, description = "Owner or project admin required"),
        (status = 404, description = "User or project not found"),
        (status = 409, description = "User is already a member of this project")
    )
)]
pub async fn add_member(
    State(state): State<AppState>,
    authz: Authorized<Own>,
    Payload(payload): Payload<AddMemberRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ProjectMember>>)> {
    let user_id = payload.user_id.ok_or_else(|| AppError::bad_request("User ID is required"))?;
    let role = match payload.role.as_deref() {
        Some(role) => ProjectRole::from_input(role)?,
        None => ProjectRole::Member,
    };

    if !users::profile_exists(&state.pool, user_id).await? {
        return Err(AppError::not_found("User not found"));
    }
    ensure_project(&state, authz.project_id).await?;

    let member = members::insert(&state.pool, authz.project_id, user_id, role, authz.user.user_id)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict("User is already a member of this project")
            }
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::not_found("User or project no longer exists")
            }
            other => AppError::from(other),
        })?;

    tracing::info!(
        project_id = %authz.project_id,
        user_id = %user_id,
        role = role.as_str(),
        "member added"
    );

    Ok(ApiResponse::created(member, "Member added to project successfully"))
}

#[utoipa::path(
    put,
    path = "/api/v1/projects/{project_id}/members/{user_id}",
    tag = "Members",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("user_id" = Uuid, Path, description = "Member's user id")
    ),
    request_body = UpdateMemberRequest,
    responses(
        (status = 200, description = "Role updated", body = ProjectMember),
        (status = 400, description = "Missing or invalid role"),
        (status = 403, description = "Owner or project admin required"),
        (status = 404, description = "Not a member of this project")
    )
)]
pub async fn update_member(
    State(state): State<AppState>,
    authz: Authorized<Own>,
    Path((_project_id, user_id)): Path<(String, String)>,
    Payload(payload): Payload<UpdateMemberRequest>,
) -> AppResult<Json<ApiResponse<ProjectMember>>> {
    let user_id = parse_id(&user_id, "user")?;
    let role = payload
        .role
        .as_deref()
        .filter(|role| !role.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("Role is required"))?;
    let role = ProjectRole::from_input(role)?;

    let member = members::update_role(&state.pool, authz.project_id, user_id, role)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_A_MEMBER))?;

    Ok(ApiResponse::ok_with_message(member, "Member role updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/projects/{project_id}/members/{user_id}",
    tag = "Members",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("user_id" = Uuid, Path, description = "Member's user id")
    ),
    responses(
        (status = 200, description = "Member removed"),
        (status = 403, description = "Owner or project admin required"),
        (status = 404, description = "Not a member of this project")
    )
)]
pub async fn remove_member(
    State(state): State<AppState>,
    authz: Authorized<Own>,
    Path((_project_id, user_id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<()>>> {
    let user_id: Uuid = parse_id(&user_id, "user")?;

    if members::delete(&state.pool, authz.project_id, user_id).await? == 0 {
        return Err(AppError::not_found(NOT_A_MEMBER));
    }

    Ok(ApiResponse::message("Member removed from project successfully"))
}
