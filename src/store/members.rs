use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::ProjectRole;
use crate::errors::AppResult;
use crate::models::member::ProjectMember;
use crate::utils::utc_now;

const MEMBER_COLUMNS: &str = "id, project_id, user_id, role, added_by, added_at";

/// Members in the order they were added.
pub async fn list(pool: &SqlitePool, project_id: Uuid) -> AppResult<Vec<ProjectMember>> {
    let members = sqlx::query_as::<_, ProjectMember>(&format!(
        "SELECT {MEMBER_COLUMNS} FROM project_members WHERE project_id = ? ORDER BY added_at ASC, rowid ASC"
    ))
    .bind(project_id)
    .fetch_all(pool)
    .await?;

    Ok(members)
}

pub async fn find(pool: &SqlitePool, project_id: Uuid, user_id: Uuid) -> AppResult<Option<ProjectMember>> {
    let member = sqlx::query_as::<_, ProjectMember>(&format!(
        "SELECT {MEMBER_COLUMNS} FROM project_members WHERE project_id = ? AND user_id = ?"
    ))
    .bind(project_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(member)
}

pub async fn is_member(pool: &SqlitePool, project_id: Uuid, user_id: Uuid) -> AppResult<bool> {
    let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM project_members WHERE project_id = ? AND user_id = ?")
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(found.is_some())
}

/// The unique index on `(project_id, user_id)` rejects duplicates; callers
/// translate that violation.
pub async fn insert(
    pool: &SqlitePool,
    project_id: Uuid,
    user_id: Uuid,
    role: ProjectRole,
    added_by: Uuid,
) -> Result<ProjectMember, sqlx::Error> {
    let member = ProjectMember {
        id: Uuid::new_v4(),
        project_id,
        user_id,
        role: role.as_str().to_string(),
        added_by: Some(added_by),
        added_at: utc_now(),
    };

    sqlx::query(
        "INSERT INTO project_members (id, project_id, user_id, role, added_by, added_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(member.id)
    .bind(member.project_id)
    .bind(member.user_id)
    .bind(&member.role)
    .bind(member.added_by)
    .bind(member.added_at)
    .execute(pool)
    .await?;

    Ok(member)
}

pub async fn update_role(
    pool: &SqlitePool,
    project_id: Uuid,
    user_id: Uuid,
    role: ProjectRole,
) -> AppResult<Option<ProjectMember>> {
    let updated = sqlx::query("UPDATE project_members SET role = ? WHERE project_id = ? AND user_id = ?")
        .bind(role.as_str())
        .bind(project_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if updated.rows_affected() == 0 {
        return Ok(None);
    }

    find(pool, project_id, user_id).await
}

pub async fn delete(pool: &SqlitePool, project_id: Uuid, user_id: Uuid) -> AppResult<u64> {
    let deleted = sqlx::query("DELETE FROM project_members WHERE project_id = ? AND user_id = ?")
        .bind(project_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(deleted.rows_affected())
}
