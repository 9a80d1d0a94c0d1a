use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{parse_id, Access, Authorized, Write};
use crate::errors::{AppError, AppResult};
use crate::models::subtask::{Subtask, SubtaskCreateRequest, SubtaskUpdateRequest};
use crate::payload::Payload;
use crate::response::ApiResponse;
use crate::store::subtasks::{self, NewSubtask, SubtaskChanges};
use crate::store::tasks;
use crate::utils::non_blank;

async fn ensure_task(state: &AppState, project_id: Uuid, task_id: Uuid) -> AppResult<()> {
    if tasks::exists(&state.pool, project_id, task_id).await? {
        Ok(())
    } else {
        Err(AppError::not_found("Task not found"))
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/tasks/{project_id}/t/{task_id}/subtasks",
    tag = "Subtasks",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("task_id" = Uuid, Path, description = "Task id")
    ),
    responses(
        (status = 200, description = "Subtasks ordered by order_index", body = [Subtask]),
        (status = 404, description = "Task not found")
    )
)]
pub async fn list_subtasks(
    State(state): State<AppState>,
    authz: Authorized<Access>,
    Path((_project_id, task_id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<Vec<Subtask>>>> {
    let task_id = parse_id(&task_id, "task")?;
    ensure_task(&state, authz.project_id, task_id).await?;

    let subtasks = subtasks::list_for_task(&state.pool, task_id).await?;
    Ok(ApiResponse::list(subtasks))
}

#[utoipa::path(
    post,
    path = "/api/v1/tasks/{project_id}/t/{task_id}/subtasks",
    tag = "Subtasks",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("task_id" = Uuid, Path, description = "Task id")
    ),
    request_body = SubtaskCreateRequest,
    responses(
        (status = 201, description = "Subtask created", body = Subtask),
        (status = 400, description = "Subtask title is required"),
        (status = 403, description = "Write access required"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn create_subtask(
    State(state): State<AppState>,
    authz: Authorized<Write>,
    Path((_project_id, task_id)): Path<(String, String)>,
    Payload(payload): Payload<SubtaskCreateRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Subtask>>)> {
    let task_id = parse_id(&task_id, "task")?;
    let title = non_blank(payload.title.as_deref()).ok_or_else(|| AppError::bad_request("Subtask title is required"))?;

    ensure_task(&state, authz.project_id, task_id).await?;

    let subtask = subtasks::insert(
        &state.pool,
        NewSubtask {
            task_id,
            title,
            order_index: payload.order_index.unwrap_or(0),
            ai_generated: payload.ai_generated.unwrap_or(false),
        },
    )
    .await?;

    Ok(ApiResponse::created(subtask, "Subtask created successfully"))
}

#[utoipa::path(
    put,
    path = "/api/v1/tasks/{project_id}/st/{subtask_id}",
    tag = "Subtasks",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("subtask_id" = Uuid, Path, description = "Subtask id")
    ),
    request_body = SubtaskUpdateRequest,
    responses(
        (status = 200, description = "Subtask updated", body = Subtask),
        (status = 400, description = "No valid fields to update"),
        (status = 404, description = "Subtask not found")
    )
)]
pub async fn update_subtask(
    State(state): State<AppState>,
    authz: Authorized<Write>,
    Path((_project_id, subtask_id)): Path<(String, String)>,
    Payload(payload): Payload<SubtaskUpdateRequest>,
) -> AppResult<Json<ApiResponse<Subtask>>> {
    let subtask_id = parse_id(&subtask_id, "subtask")?;

    let changes = SubtaskChanges {
        title: non_blank(payload.title.as_deref()),
        is_completed: payload.is_completed,
        order_index: payload.order_index,
    };

    if changes.is_empty() {
        return Err(AppError::bad_request("No valid fields to update"));
    }

    let subtask = subtasks::update(&state.pool, authz.project_id, subtask_id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Subtask not found"))?;

    Ok(ApiResponse::ok_with_message(subtask, "Subtask updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{project_id}/st/{subtask_id}",
    tag = "Subtasks",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("subtask_id" = Uuid, Path, description = "Subtask id")
    ),
    responses(
        (status = 200, description = "Subtask deleted"),
        (status = 404, description = "Subtask not found")
    )
)]
pub async fn delete_subtask(
    State(state): State<AppState>,
    authz: Authorized<Write>,
    Path((_project_id, subtask_id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<()>>> {
    let subtask_id = parse_id(&subtask_id, "subtask")?;

    if subtasks::delete(&state.pool, authz.project_id, subtask_id).await? == 0 {
        return Err(AppError::not_found("Subtask not found"));
    }

    Ok(ApiResponse::message("Subtask deleted successfully"))
}
