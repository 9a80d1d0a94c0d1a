use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::task::{Task, TaskListQuery};
use crate::utils::utc_now;

const TASK_COLUMNS: &str = "id, project_id, title, description, status, priority, is_critical, assigned_to, created_by, goal, expected_outcome, definition_of_done, due_date, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: Option<String>,
    pub is_critical: bool,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    pub goal: Option<String>,
    pub expected_outcome: Option<String>,
    pub definition_of_done: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    pub priority: Option<Option<String>>,
    pub is_critical: Option<bool>,
    pub assigned_to: Option<Option<Uuid>>,
    pub goal: Option<Option<String>>,
    pub expected_outcome: Option<Option<String>>,
    pub definition_of_done: Option<Option<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.is_critical.is_none()
            && self.assigned_to.is_none()
            && self.goal.is_none()
            && self.expected_outcome.is_none()
            && self.definition_of_done.is_none()
            && self.due_date.is_none()
    }
}

/// Tasks of a project, newest first, narrowed by the optional filters.
pub async fn list(pool: &SqlitePool, project_id: Uuid, filter: &TaskListQuery) -> AppResult<Vec<Task>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = "));
    qb.push_bind(project_id);

    if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND status = ").push_bind(status.to_string());
    }
    if let Some(assigned_to) = filter.assigned_to {
        qb.push(" AND assigned_to = ").push_bind(assigned_to);
    }
    if let Some(priority) = filter.priority.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND priority = ").push_bind(priority.to_string());
    }
    qb.push(" ORDER BY created_at DESC, rowid DESC");

    let tasks = qb.build_query_as::<Task>().fetch_all(pool).await?;
    Ok(tasks)
}

/// Looks a task up within its project; a task of another project is `None`.
pub async fn find(pool: &SqlitePool, project_id: Uuid, task_id: Uuid) -> AppResult<Option<Task>> {
    let task = sqlx::query_as::<_, Task>(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = ? AND project_id = ?"
    ))
    .bind(task_id)
    .bind(project_id)
    .fetch_optional(pool)
    .await?;

    Ok(task)
}

pub async fn exists(pool: &SqlitePool, project_id: Uuid, task_id: Uuid) -> AppResult<bool> {
    let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM tasks WHERE id = ? AND project_id = ?")
        .bind(task_id)
        .bind(project_id)
        .fetch_optional(pool)
        .await?;

    Ok(found.is_some())
}

pub async fn insert(pool: &SqlitePool, new: NewTask) -> AppResult<Task> {
    let now = utc_now();
    let task = Task {
        id: Uuid::new_v4(),
        project_id: new.project_id,
        title: new.title,
        description: new.description,
        status: new.status,
        priority: new.priority,
        is_critical: new.is_critical,
        assigned_to: new.assigned_to,
        created_by: new.created_by,
        goal: new.goal,
        expected_outcome: new.expected_outcome,
        definition_of_done: new.definition_of_done,
        due_date: new.due_date,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(&format!(
        "INSERT INTO tasks ({TASK_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(task.id)
    .bind(task.project_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.status)
    .bind(&task.priority)
    .bind(task.is_critical)
    .bind(task.assigned_to)
    .bind(task.created_by)
    .bind(&task.goal)
    .bind(&task.expected_outcome)
    .bind(&task.definition_of_done)
    .bind(task.due_date)
    .bind(task.created_at)
    .bind(task.updated_at)
    .execute(pool)
    .await?;

    Ok(task)
}

pub async fn update(
    pool: &SqlitePool,
    project_id: Uuid,
    task_id: Uuid,
    changes: TaskChanges,
) -> AppResult<Option<Task>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE tasks SET ");
    let mut sets = qb.separated(", ");

    if let Some(title) = changes.title {
        sets.push("title = ").push_bind_unseparated(title);
    }
    if let Some(description) = changes.description {
        sets.push("description = ").push_bind_unseparated(description);
    }
    if let Some(status) = changes.status {
        sets.push("status = ").push_bind_unseparated(status);
    }
    if let Some(priority) = changes.priority {
        sets.push("priority = ").push_bind_unseparated(priority);
    }
    if let Some(is_critical) = changes.is_critical {
        sets.push("is_critical = ").push_bind_unseparated(is_critical);
    }
    if let Some(assigned_to) = changes.assigned_to {
        sets.push("assigned_to = ").push_bind_unseparated(assigned_to);
    }
    if let Some(goal) = changes.goal {
        sets.push("goal = ").push_bind_unseparated(goal);
    }
    if let Some(expected_outcome) = changes.expected_outcome {
        sets.push("expected_outcome = ").push_bind_unseparated(expected_outcome);
    }
    if let Some(definition_of_done) = changes.definition_of_done {
        sets.push("definition_of_done = ").push_bind_unseparated(definition_of_done);
    }
    if let Some(due_date) = changes.due_date {
        sets.push("due_date = ").push_bind_unseparated(due_date);
    }
    sets.push("updated_at = ").push_bind_unseparated(utc_now());

    qb.push(" WHERE id = ").push_bind(task_id);
    qb.push(" AND project_id = ").push_bind(project_id);

    let updated = qb.build().execute(pool).await?;
    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    find(pool, project_id, task_id).await
}

pub async fn delete(pool: &SqlitePool, project_id: Uuid, task_id: Uuid) -> AppResult<u64> {
    let deleted = sqlx::query("DELETE FROM tasks WHERE id = ? AND project_id = ?")
        .bind(task_id)
        .bind(project_id)
        .execute(pool)
        .await?;

    Ok(deleted.rows_affected())
}
