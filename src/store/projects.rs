use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::authz::ProjectRole;
use crate::errors::AppResult;
use crate::models::project::Project;
use crate::utils::utc_now;

const PROJECT_COLUMNS: &str =
    "p.id, p.name, p.description, p.status, p.created_by, p.start_date, p.target_end_date, p.actual_end_date, p.created_at, p.updated_at";

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub created_by: Uuid,
    pub start_date: Option<NaiveDate>,
    pub target_end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    pub start_date: Option<Option<NaiveDate>>,
    pub target_end_date: Option<Option<NaiveDate>>,
    pub actual_end_date: Option<Option<NaiveDate>>,
}

impl ProjectChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.start_date.is_none()
            && self.target_end_date.is_none()
            && self.actual_end_date.is_none()
    }
}

/// Inserts a project. With `enroll_creator` the creator also gets an `owner`
/// membership row in the same transaction.
pub async fn insert(pool: &SqlitePool, new: NewProject, enroll_creator: bool) -> AppResult<Project> {
    let now = utc_now();
    let project_id = Uuid::new_v4();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO projects (id, name, description, status, created_by, start_date, target_end_date, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(project_id)
    .bind(&new.name)
    .bind(&new.description)
    .bind(&new.status)
    .bind(new.created_by)
    .bind(new.start_date)
    .bind(new.target_end_date)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    if enroll_creator {
        sqlx::query(
            "INSERT INTO project_members (id, project_id, user_id, role, added_by, added_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(project_id)
        .bind(new.created_by)
        .bind(ProjectRole::Owner.as_str())
        .bind(new.created_by)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(Project {
        id: project_id,
        name: new.name,
        description: new.description,
        status: new.status,
        created_by: new.created_by,
        start_date: new.start_date,
        target_end_date: new.target_end_date,
        actual_end_date: None,
        created_at: now,
        updated_at: now,
    })
}

pub async fn list_all(pool: &SqlitePool) -> AppResult<Vec<Project>> {
    let projects = sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects p ORDER BY p.created_at DESC, p.rowid DESC"
    ))
    .fetch_all(pool)
    .await?;

    Ok(projects)
}

pub async fn list_for_member(pool: &SqlitePool, user_id: Uuid) -> AppResult<Vec<Project>> {
    let projects = sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects p JOIN project_members m ON m.project_id = p.id WHERE m.user_id = ? ORDER BY p.created_at DESC, p.rowid DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(projects)
}

pub async fn find(pool: &SqlitePool, project_id: Uuid) -> AppResult<Option<Project>> {
    let project = sqlx::query_as::<_, Project>(&format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = ?"))
        .bind(project_id)
        .fetch_optional(pool)
        .await?;

    Ok(project)
}

pub async fn exists(pool: &SqlitePool, project_id: Uuid) -> AppResult<bool> {
    let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM projects WHERE id = ?")
        .bind(project_id)
        .fetch_optional(pool)
        .await?;

    Ok(found.is_some())
}

/// Applies the present fields. `None` when the project does not exist.
pub async fn update(pool: &SqlitePool, project_id: Uuid, changes: ProjectChanges) -> AppResult<Option<Project>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE projects SET ");
    let mut sets = qb.separated(", ");

    if let Some(name) = changes.name {
        sets.push("name = ").push_bind_unseparated(name);
    }
    if let Some(description) = changes.description {
        sets.push("description = ").push_bind_unseparated(description);
    }
    if let Some(status) = changes.status {
        sets.push("status = ").push_bind_unseparated(status);
    }
    if let Some(start_date) = changes.start_date {
        sets.push("start_date = ").push_bind_unseparated(start_date);
    }
    if let Some(target_end_date) = changes.target_end_date {
        sets.push("target_end_date = ").push_bind_unseparated(target_end_date);
    }
    if let Some(actual_end_date) = changes.actual_end_date {
        sets.push("actual_end_date = ").push_bind_unseparated(actual_end_date);
    }
    sets.push("updated_at = ").push_bind_unseparated(utc_now());

    qb.push(" WHERE id = ").push_bind(project_id);
    let updated = qb.build().execute(pool).await?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    find(pool, project_id).await
}

pub async fn delete(pool: &SqlitePool, project_id: Uuid) -> AppResult<u64> {
    let deleted = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(project_id)
        .execute(pool)
        .await?;

    Ok(deleted.rows_affected())
}
