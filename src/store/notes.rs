use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::note::{DbNote, Note, NoteListQuery};
use crate::utils::utc_now;

const NOTE_COLUMNS: &str =
    "id, project_id, title, content, category, tags, is_pinned, is_decision, created_by, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewNote {
    pub project_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub is_decision: bool,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
    pub is_decision: Option<bool>,
}

impl NoteChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.is_pinned.is_none()
            && self.is_decision.is_none()
    }
}

/// Pinned notes first, then newest first.
pub async fn list(pool: &SqlitePool, project_id: Uuid, filter: &NoteListQuery) -> AppResult<Vec<Note>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT {NOTE_COLUMNS} FROM notes WHERE project_id = "));
    qb.push_bind(project_id);

    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        qb.push(" AND category = ").push_bind(category.to_string());
    }
    if let Some(is_pinned) = filter.is_pinned {
        qb.push(" AND is_pinned = ").push_bind(is_pinned);
    }
    if let Some(is_decision) = filter.is_decision {
        qb.push(" AND is_decision = ").push_bind(is_decision);
    }
    qb.push(" ORDER BY is_pinned DESC, created_at DESC, rowid DESC");

    let notes = qb.build_query_as::<DbNote>().fetch_all(pool).await?;
    Ok(notes.into_iter().map(Note::from).collect())
}

pub async fn find(pool: &SqlitePool, project_id: Uuid, note_id: Uuid) -> AppResult<Option<Note>> {
    let note = sqlx::query_as::<_, DbNote>(&format!(
        "SELECT {NOTE_COLUMNS} FROM notes WHERE id = ? AND project_id = ?"
    ))
    .bind(note_id)
    .bind(project_id)
    .fetch_optional(pool)
    .await?;

    Ok(note.map(Note::from))
}

pub async fn insert(pool: &SqlitePool, new: NewNote) -> AppResult<Note> {
    let now = utc_now();
    let note = Note {
        id: Uuid::new_v4(),
        project_id: new.project_id,
        title: new.title,
        content: new.content,
        category: new.category,
        tags: new.tags,
        is_pinned: new.is_pinned,
        is_decision: new.is_decision,
        created_by: new.created_by,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(&format!(
        "INSERT INTO notes ({NOTE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(note.id)
    .bind(note.project_id)
    .bind(&note.title)
    .bind(&note.content)
    .bind(&note.category)
    .bind(Json(&note.tags))
    .bind(note.is_pinned)
    .bind(note.is_decision)
    .bind(note.created_by)
    .bind(note.created_at)
    .bind(note.updated_at)
    .execute(pool)
    .await?;

    Ok(note)
}

pub async fn update(
    pool: &SqlitePool,
    project_id: Uuid,
    note_id: Uuid,
    changes: NoteChanges,
) -> AppResult<Option<Note>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE notes SET ");
    let mut sets = qb.separated(", ");

    if let Some(title) = changes.title {
        sets.push("title = ").push_bind_unseparated(title);
    }
    if let Some(content) = changes.content {
        sets.push("content = ").push_bind_unseparated(content);
    }
    if let Some(category) = changes.category {
        sets.push("category = ").push_bind_unseparated(category);
    }
    if let Some(tags) = changes.tags {
        sets.push("tags = ").push_bind_unseparated(Json(tags));
    }
    if let Some(is_pinned) = changes.is_pinned {
        sets.push("is_pinned = ").push_bind_unseparated(is_pinned);
    }
    if let Some(is_decision) = changes.is_decision {
        sets.push("is_decision = ").push_bind_unseparated(is_decision);
    }
    sets.push("updated_at = ").push_bind_unseparated(utc_now());

    qb.push(" WHERE id = ").push_bind(note_id);
    qb.push(" AND project_id = ").push_bind(project_id);

    let updated = qb.build().execute(pool).await?;
    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    find(pool, project_id, note_id).await
}

pub async fn delete(pool: &SqlitePool, project_id: Uuid, note_id: Uuid) -> AppResult<u64> {
    let deleted = sqlx::query("DELETE FROM notes WHERE id = ? AND project_id = ?")
        .bind(note_id)
        .bind(project_id)
        .execute(pool)
        .await?;

    Ok(deleted.rows_affected())
}
