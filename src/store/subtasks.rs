use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::subtask::Subtask;
use crate::utils::utc_now;

const SUBTASK_COLUMNS: &str = "s.id, s.task_id, s.title, s.is_completed, s.order_index, s.ai_generated, s.completed_at, s.created_at";

#[derive(Debug, Clone)]
pub struct NewSubtask {
    pub task_id: Uuid,
    pub title: String,
    pub order_index: i64,
    pub ai_generated: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SubtaskChanges {
    pub title: Option<String>,
    pub is_completed: Option<bool>,
    pub order_index: Option<i64>,
}

impl SubtaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.is_completed.is_none() && self.order_index.is_none()
    }
}

pub async fn list_for_task(pool: &SqlitePool, task_id: Uuid) -> AppResult<Vec<Subtask>> {
    let subtasks = sqlx::query_as::<_, Subtask>(&format!(
        "SELECT {SUBTASK_COLUMNS} FROM subtasks s WHERE s.task_id = ? ORDER BY s.order_index ASC, s.created_at ASC, s.rowid ASC"
    ))
    .bind(task_id)
    .fetch_all(pool)
    .await?;

    Ok(subtasks)
}

/// Every subtask of a project keyed by task, each list in display order.
pub async fn by_task_for_project(pool: &SqlitePool, project_id: Uuid) -> AppResult<HashMap<Uuid, Vec<Subtask>>> {
    let rows = sqlx::query_as::<_, Subtask>(&format!(
        "SELECT {SUBTASK_COLUMNS} FROM subtasks s JOIN tasks t ON t.id = s.task_id WHERE t.project_id = ? ORDER BY s.order_index ASC, s.created_at ASC, s.rowid ASC"
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<Subtask>> = HashMap::new();
    for subtask in rows {
        grouped.entry(subtask.task_id).or_default().push(subtask);
    }

    Ok(grouped)
}

pub async fn insert(pool: &SqlitePool, new: NewSubtask) -> AppResult<Subtask> {
    let subtask = Subtask {
        id: Uuid::new_v4(),
        task_id: new.task_id,
        title: new.title,
        is_completed: false,
        order_index: new.order_index,
        ai_generated: new.ai_generated,
        completed_at: None,
        created_at: utc_now(),
    };

    sqlx::query(
        "INSERT INTO subtasks (id, task_id, title, is_completed, order_index, ai_generated, completed_at, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(subtask.id)
    .bind(subtask.task_id)
    .bind(&subtask.title)
    .bind(subtask.is_completed)
    .bind(subtask.order_index)
    .bind(subtask.ai_generated)
    .bind(subtask.completed_at)
    .bind(subtask.created_at)
    .execute(pool)
    .await?;

    Ok(subtask)
}

pub async fn find(pool: &SqlitePool, project_id: Uuid, subtask_id: Uuid) -> AppResult<Option<Subtask>> {
    let subtask = sqlx::query_as::<_, Subtask>(&format!(
        "SELECT {SUBTASK_COLUMNS} FROM subtasks s JOIN tasks t ON t.id = s.task_id WHERE s.id = ? AND t.project_id = ?"
    ))
    .bind(subtask_id)
    .bind(project_id)
    .fetch_optional(pool)
    .await?;

    Ok(subtask)
}

/// Updates a subtask of the given project. Completing stamps `completed_at`
/// once; reopening clears it.
pub async fn update(
    pool: &SqlitePool,
    project_id: Uuid,
    subtask_id: Uuid,
    changes: SubtaskChanges,
) -> AppResult<Option<Subtask>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE subtasks SET ");
    let mut sets = qb.separated(", ");

    if let Some(title) = changes.title {
        sets.push("title = ").push_bind_unseparated(title);
    }
    if let Some(order_index) = changes.order_index {
        sets.push("order_index = ").push_bind_unseparated(order_index);
    }
    match changes.is_completed {
        Some(true) => {
            sets.push("completed_at = CASE WHEN is_completed = 1 THEN completed_at ELSE ")
                .push_bind_unseparated(utc_now())
                .push_unseparated(" END");
            sets.push("is_completed = 1");
        }
        Some(false) => {
            sets.push("completed_at = NULL");
            sets.push("is_completed = 0");
        }
        None => {}
    }

    qb.push(" WHERE id = ").push_bind(subtask_id);
    qb.push(" AND task_id IN (SELECT id FROM tasks WHERE project_id = ")
        .push_bind(project_id)
        .push(")");

    let updated = qb.build().execute(pool).await?;
    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    find(pool, project_id, subtask_id).await
}

pub async fn delete(pool: &SqlitePool, project_id: Uuid, subtask_id: Uuid) -> AppResult<u64> {
    let deleted = sqlx::query(
        "DELETE FROM subtasks WHERE id = ? AND task_id IN (SELECT id FROM tasks WHERE project_id = ?)",
    )
    .bind(subtask_id)
    .bind(project_id)
    .execute(pool)
    .await?;

    Ok(deleted.rows_affected())
}
