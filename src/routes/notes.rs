use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::{parse_id, Access, Authorized, Write};
use crate::errors::{AppError, AppResult};
use crate::models::note::{normalize_tags, Note, NoteCreateRequest, NoteListQuery, NoteUpdateRequest};
use crate::payload::{Filters, Payload};
use crate::response::ApiResponse;
use crate::routes::projects::ensure_project;
use crate::store::notes::{self, NewNote, NoteChanges};
use crate::utils::{non_blank, nullable_text};

#[utoipa::path(
    get,
    path = "/api/v1/notes/{project_id}",
    tag = "Notes",
    params(("project_id" = Uuid, Path, description = "Project id"), NoteListQuery),
    responses(
        (status = 200, description = "Notes, pinned first then newest first", body = [Note]),
        (status = 403, description = "Not a member")
    )
)]
pub async fn list_notes(
    State(state): State<AppState>,
    authz: Authorized<Access>,
    Filters(filter): Filters<NoteListQuery>,
) -> AppResult<Json<ApiResponse<Vec<Note>>>> {
    let notes = notes::list(&state.pool, authz.project_id, &filter).await?;
    Ok(ApiResponse::list(notes))
}

#[utoipa::path(
    post,
    path = "/api/v1/notes/{project_id}",
    tag = "Notes",
    params(("project_id" = Uuid, Path, description = "Project id")),
    request_body = NoteCreateRequest,
    responses(
        (status = 201, description = "Note created", body = Note),
        (status = 400, description = "Missing title or content"),
        (status = 403, description = "Write access required"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn create_note(
    State(state): State<AppState>,
    authz: Authorized<Write>,
    Payload(payload): Payload<NoteCreateRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Note>>)> {
    let title = non_blank(payload.title.as_deref()).ok_or_else(|| AppError::bad_request("Note title is required"))?;
    let content =
        non_blank(payload.content.as_deref()).ok_or_else(|| AppError::bad_request("Note content is required"))?;

    ensure_project(&state, authz.project_id).await?;

    let note = notes::insert(
        &state.pool,
        NewNote {
            project_id: authz.project_id,
            title,
            content,
            category: non_blank(payload.category.as_deref()),
            tags: normalize_tags(payload.tags.unwrap_or_default()),
            is_pinned: payload.is_pinned.unwrap_or(false),
            is_decision: payload.is_decision.unwrap_or(false),
            created_by: authz.user.user_id,
        },
    )
    .await?;

    Ok(ApiResponse::created(note, "Note created successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/notes/{project_id}/n/{note_id}",
    tag = "Notes",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("note_id" = Uuid, Path, description = "Note id")
    ),
    responses(
        (status = 200, description = "Note detail", body = Note),
        (status = 404, description = "Note not found")
    )
)]
pub async fn get_note(
    State(state): State<AppState>,
    authz: Authorized<Access>,
    Path((_project_id, note_id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<Note>>> {
    let note_id = parse_id(&note_id, "note")?;

    let note = notes::find(&state.pool, authz.project_id, note_id)
        .await?
        .ok_or_else(|| AppError::not_found("Note not found"))?;

    Ok(ApiResponse::ok(note))
}

#[utoipa::path(
    put,
    path = "/api/v1/notes/{project_id}/n/{note_id}",
    tag = "Notes",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("note_id" = Uuid, Path, description = "Note id")
    ),
    request_body = NoteUpdateRequest,
    responses(
        (status = 200, description = "Note updated", body = Note),
        (status = 400, description = "No valid fields to update"),
        (status = 404, description = "Note not found")
    )
)]
pub async fn update_note(
    State(state): State<AppState>,
    authz: Authorized<Write>,
    Path((_project_id, note_id)): Path<(String, String)>,
    Payload(payload): Payload<NoteUpdateRequest>,
) -> AppResult<Json<ApiResponse<Note>>> {
    let note_id = parse_id(&note_id, "note")?;

    let changes = NoteChanges {
        title: non_blank(payload.title.as_deref()),
        content: non_blank(payload.content.as_deref()),
        category: nullable_text(payload.category),
        tags: payload.tags.map(normalize_tags),
        is_pinned: payload.is_pinned,
        is_decision: payload.is_decision,
    };

    if changes.is_empty() {
        return Err(AppError::bad_request("No valid fields to update"));
    }

    let note = notes::update(&state.pool, authz.project_id, note_id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Note not found"))?;

    Ok(ApiResponse::ok_with_message(note, "Note updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/notes/{project_id}/n/{note_id}",
    tag = "Notes",
    params(
        ("project_id" = Uuid, Path, description = "Project id"),
        ("note_id" = Uuid, Path, description = "Note id")
    ),
    responses(
        (status = 200, description = "Note deleted"),
        (status = 404, description = "Note not found")
    )
)]
pub async fn delete_note(
    State(state): State<AppState>,
    authz: Authorized<Write>,
    Path((_project_id, note_id)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<()>>> {
    let note_id = parse_id(&note_id, "note")?;

    if notes::delete(&state.pool, authz.project_id, note_id).await? == 0 {
        return Err(AppError::not_found("Note not found"));
    }

    Ok(ApiResponse::message("Note deleted successfully"))
}
