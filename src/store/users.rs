use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::PlatformRole;
use crate::errors::AppResult;
use crate::models::user::{DbUser, DbUserProfile};

const USER_COLUMNS: &str = "id, email, password_hash, email_verified_at, created_at, updated_at";
const PROFILE_COLUMNS: &str = "user_id, full_name, avatar_url, role, created_at";

pub async fn find_by_id(pool: &SqlitePool, user_id: Uuid) -> AppResult<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Case-insensitive through the column collation.
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> AppResult<Option<DbUser>> {
    let user = sqlx::query_as::<_, DbUser>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_profile(pool: &SqlitePool, user_id: Uuid) -> AppResult<Option<DbUserProfile>> {
    let profile = sqlx::query_as::<_, DbUserProfile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = ?"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(profile)
}

pub async fn profile_exists(pool: &SqlitePool, user_id: Uuid) -> AppResult<bool> {
    let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM user_profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(found.is_some())
}

/// Out-of-band role change used by the operator CLI. Returns the number of
/// profiles touched.
pub async fn set_platform_role(pool: &SqlitePool, email: &str, role: PlatformRole) -> AppResult<u64> {
    let updated = sqlx::query(
        "UPDATE user_profiles SET role = ? WHERE user_id = (SELECT id FROM users WHERE email = ?)",
    )
    .bind(role.as_str())
    .bind(email)
    .execute(pool)
    .await?;

    Ok(updated.rows_affected())
}
