use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{parse_id, Access, Authorized, Write};
use crate::errors::{AppError, AppResult};
use crate::models::task::{
    Task, TaskCreateRequest, TaskListQuery, TaskUpdateRequest, TaskWithSubtasks, DEFAULT_TASK_STATUS,
};
use crate::payload::{Filters, Payload};
use crate::response::ApiResponse;
use crate::routes::projects::ensure_project;
use crate::store::tasks::{self, NewTask, TaskChanges};
use crate::store::{members, subtasks};
use crate::utils::{non_blank, nullable_text};

#[utoipa::path(
    get,
    path = "/api/v1/tasks/{project_id}",
    tag = "Tasks",
    params(("project_id" = Uuid, Path, description = "Project id"), TaskListQuery),
    responses(
        (status = 200, description = "Tasks with their subtasks, newest first", body = [TaskWithSubtasks]),
        (status = 403, description = "Not a member")
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    authz: Authorized<Access>,
    Filters(filter): Filters<TaskListQuery>,
) -> AppResult<Json<ApiResponse<Vec<TaskWithSubtasks>>>> {
    let found = tasks::list(&state.pool, authz.project_id, &filter).await?;
    let mut by_task = subtasks::by_task_for_project(&state.pool, authz.project_id).await?;

    let tasks = found
        .into_iter()
        .map(|task| {
            let subtasks = by_task.remove(&task.id).unwrap_or_default();
            TaskWithSubtasks { task, subtasks }
        })
        .collect();

    Ok(ApiResponse::list(tasks))
}

#[utoipa::path(
    post,
    path = "/api/v1/tasks/{project_id}",
    tag = "Tasks",
    params(("project_id" = Uuid, Path, description = "Project id")),
    request_body = TaskCreateRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Missing title or assignee outside the project"),
        (status = 403, description = "Write access required"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    authz: Authorized<Write>,
    Payload(payload): Payload<TaskCreateRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Task>>)> {
    let title = non_blank(payload.title.as_deref()).ok_or_else(|| AppError::bad_request("Task title is required"))?;

    ensure_project(&state, authz.project_id).await?;

    if let Some(assignee) = payload.assigned_to {
        if !members::is_member(&state.pool, authz.project_id, assignee).await? {
            return Err(AppError::bad_request("Assigned user must be a member of the project"));
        }
    }

    let new = NewTask {
        project_id: authz.project_id,
        title,
        description: non_blank(payload.description.as_deref()),
        status: non_blank(payload.status.as_deref()).unwrap_or_else(|| DEFAULT_TASK_STATUS.to_string()),
        priority: non_blank(payload.priority.as_deref()),
        is_critical: payload.is_critical.unwrap_or(false),
        assigned_to: payload.assigned_to,
        created_by: authz.user.user_id,
        goal: non_blank(payload.goal.as_deref()),
        expected_outcome: non_blank(payload.expected_outcome.as_deref()),
        definition_of_done: non_blank(payload.definition_of_done.as_deref()),
        due_date: payload.due_date,
    };

    let task = tasks::insert(&state.pool, new).await?;
    Ok(ApiResponse::created(task, "Task created successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/tasks/{project_id}/t/{task_id}",
    tag = "Tasks",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("task_id" = Uuid, Path, description = "Task id")
    ),
    responses(
        (status = 200, description = "Task with its subtasks", body = TaskWithSubtasks),
        (status = 404, description = "Task not found")
    )
)]
pub async fn get_task(
    State(state): State<AppState>,
    authz: Authorized<Access>,
    Path((_project_id, task_id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<TaskWithSubtasks>>> {
    let task_id = parse_id(&task_id, "task")?;

    let task = tasks::find(&state.pool, authz.project_id, task_id)
        .await?
        .ok_or_else(|| AppError::not_found("Task not found"))?;
    let subtasks = subtasks::list_for_task(&state.pool, task.id).await?;

    Ok(ApiResponse::ok(TaskWithSubtasks { task, subtasks }))
}

#[utoipa::path(
    put,
    path = "/api/v1/tasks/{project_id}/t/{task_id}",
    tag = "Tasks",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("task_id" = Uuid, Path, description = "Task id")
    ),
    request_body = TaskUpdateRequest,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "No valid fields to update"),
        (status = 403, description = "Write access required"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn update_task(
    State(state): State<AppState>,
    authz: Authorized<Write>,
    Path((_project_id, task_id)): Path<(String, String)>,
    Payload(payload): Payload<TaskUpdateRequest>,
) -> AppResult<Json<ApiResponse<Task>>> {
    let task_id = parse_id(&task_id, "task")?;

    // assigned_to is only checked against membership on creation
    let changes = TaskChanges {
        title: non_blank(payload.title.as_deref()),
        description: nullable_text(payload.description),
        status: non_blank(payload.status.as_deref()),
        priority: nullable_text(payload.priority),
        is_critical: payload.is_critical,
        assigned_to: payload.assigned_to,
        goal: nullable_text(payload.goal),
        expected_outcome: nullable_text(payload.expected_outcome),
        definition_of_done: nullable_text(payload.definition_of_done),
        due_date: payload.due_date,
    };

    if changes.is_empty() {
        return Err(AppError::bad_request("No valid fields to update"));
    }

    let task = tasks::update(&state.pool, authz.project_id, task_id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Task not found"))?;

    Ok(ApiResponse::ok_with_message(task, "Task updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{project_id}/t/{task_id}",
    tag = "Tasks",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("task_id" = Uuid, Path, description = "Task id")
    ),
    responses(
        (status = 200, description = "Task and its subtasks deleted"),
        (status = 403, description = "Write access required"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn delete_task(
    State(state): State<AppState>,
    authz: Authorized<Write>,
    Path((_project_id, task_id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<()>>> {
    let task_id = parse_id(&task_id, "task")?;

    if tasks::delete(&state.pool, authz.project_id, task_id).await? == 0 {
        return Err(AppError::not_found("Task not found"));
    }

    Ok(ApiResponse::message("Task deleted successfully"))
}
