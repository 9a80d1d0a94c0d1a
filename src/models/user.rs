use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::PlatformRole;
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbUser> for User {
    fn from(value: DbUser) -> Self {
        User {
            id: value.id,
            email: value.email,
            email_verified: value.email_verified_at.is_some(),
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    /// Canonical platform role: `member` or `platform_admin`.
    #[schema(example = "member")]
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbUserProfile {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<DbUserProfile> for UserProfile {
    fn from(value: DbUserProfile) -> Self {
        UserProfile {
            user_id: value.user_id,
            full_name: value.full_name,
            avatar_url: value.avatar_url,
            role: PlatformRole::parse(&value.role).as_str().to_string(),
            created_at: value.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RegisterMetadata {
    #[schema(example = "Ada Lovelace")]
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "secret123")]
    pub password: String,
    pub metadata: Option<RegisterMetadata>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "secret123")]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EmailRequest {
    #[schema(example = "user@example.com")]
    pub email: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ResendVerificationRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    #[serde(alias = "newPassword")]
    #[schema(example = "new-secret123")]
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    #[serde(alias = "oldPassword")]
    #[schema(example = "secret123")]
    pub old_password: String,
    #[serde(alias = "newPassword")]
    #[schema(example = "new-secret123")]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisteredUser {
    pub user: User,
    pub profile: UserProfile,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentUser {
    pub user: User,
    pub profile: Option<UserProfile>,
}

/// Payload for the e-mail that would carry an opaque action token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub user_id: Uuid,
    pub token: String,
}

pub fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'))
        .unwrap_or(false);

    if !valid {
        return Err(AppError::bad_request("A valid email address is required"));
    }

    Ok(email)
}
