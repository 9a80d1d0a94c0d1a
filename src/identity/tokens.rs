use chrono::Duration;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::utils::{generate_token, hash_token, utc_now};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    EmailVerification,
    PasswordReset,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::EmailVerification => "email_verification",
            TokenPurpose::PasswordReset => "password_reset",
        }
    }

    fn rejection(&self) -> &'static str {
        match self {
            TokenPurpose::EmailVerification => "Email verification failed. The link may be invalid or expired.",
            TokenPurpose::PasswordReset => "Invalid or expired reset token",
        }
    }
}

/// Stores the digest of a fresh single-use token and returns the raw value.
pub async fn issue(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    purpose: TokenPurpose,
    lifetime_hours: i64,
) -> AppResult<String> {
    let token = generate_token();
    let now = utc_now();

    sqlx::query(
        "INSERT INTO auth_tokens (token_hash, user_id, purpose, expires_at, used_at, created_at) VALUES (?, ?, ?, ?, NULL, ?)",
    )
    .bind(hash_token(&token))
    .bind(user_id)
    .bind(purpose.as_str())
    .bind(now + Duration::hours(lifetime_hours))
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(token)
}

/// Marks a token used and yields its owner. Unknown, expired, reused or
/// wrong-purpose tokens are all the same validation error.
pub async fn consume(conn: &mut SqliteConnection, token: &str, purpose: TokenPurpose) -> AppResult<Uuid> {
    let now = utc_now();

    let user_id = sqlx::query_scalar::<_, Uuid>(
        "UPDATE auth_tokens SET used_at = ? WHERE token_hash = ? AND purpose = ? AND used_at IS NULL AND expires_at > ? RETURNING user_id",
    )
    .bind(now)
    .bind(hash_token(token.trim()))
    .bind(purpose.as_str())
    .bind(now)
    .fetch_optional(&mut *conn)
    .await?;

    user_id.ok_or_else(|| AppError::bad_request(purpose.rejection()))
}
