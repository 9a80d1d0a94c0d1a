use chrono::Duration;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::utils::{generate_token, hash_token, utc_now};

/// Row written for every login or refresh. Only the refresh token digest is kept.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub id: Uuid,
    pub refresh_token: String,
}

pub async fn open(conn: &mut SqliteConnection, user_id: Uuid, lifetime_days: i64) -> AppResult<NewSession> {
    let session = NewSession {
        id: Uuid::new_v4(),
        refresh_token: generate_token(),
    };
    let now = utc_now();

    sqlx::query(
        "INSERT INTO auth_sessions (id, user_id, refresh_token_hash, expires_at, revoked_at, created_at) VALUES (?, ?, ?, ?, NULL, ?)",
    )
    .bind(session.id)
    .bind(user_id)
    .bind(hash_token(&session.refresh_token))
    .bind(now + Duration::days(lifetime_days))
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(session)
}

/// Revokes the live session holding `refresh_token` and returns its user.
/// A token can be rotated exactly once.
pub async fn rotate(conn: &mut SqliteConnection, refresh_token: &str) -> AppResult<Option<Uuid>> {
    let now = utc_now();

    let user_id = sqlx::query_scalar::<_, Uuid>(
        "UPDATE auth_sessions SET revoked_at = ? WHERE refresh_token_hash = ? AND revoked_at IS NULL AND expires_at > ? RETURNING user_id",
    )
    .bind(now)
    .bind(hash_token(refresh_token.trim()))
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(user_id)
}

pub async fn revoke(conn: &mut SqliteConnection, session_id: Uuid) -> AppResult<()> {
    sqlx::query("UPDATE auth_sessions SET revoked_at = ? WHERE id = ? AND revoked_at IS NULL")
        .bind(utc_now())
        .bind(session_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Revokes every live session of a user, optionally sparing one.
pub async fn revoke_all(conn: &mut SqliteConnection, user_id: Uuid, keep: Option<Uuid>) -> AppResult<u64> {
    let revoked = sqlx::query(
        "UPDATE auth_sessions SET revoked_at = ? WHERE user_id = ? AND revoked_at IS NULL AND (? IS NULL OR id != ?)",
    )
    .bind(utc_now())
    .bind(user_id)
    .bind(keep)
    .bind(keep)
    .execute(&mut *conn)
    .await?;

    Ok(revoked.rows_affected())
}

/// E-mail of the session's user when the session is still live.
pub async fn live_email(conn: &mut SqliteConnection, session_id: Uuid, user_id: Uuid) -> AppResult<Option<String>> {
    let email = sqlx::query_scalar::<_, String>(
        "SELECT u.email FROM auth_sessions s JOIN users u ON u.id = s.user_id WHERE s.id = ? AND s.user_id = ? AND s.revoked_at IS NULL",
    )
    .bind(session_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(email)
}
