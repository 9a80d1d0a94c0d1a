//! In-process identity provider.
//!
//! Access tokens are short-lived HS256 JWTs bound to a session row; refresh
//! tokens and the single-use e-mail verification and password reset tokens
//! are opaque random strings of which only a SHA-256 digest is stored.

mod sessions;
mod tokens;

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::authz::PlatformRole;
use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::jwt::{AuthUser, JwtConfig};
use crate::models::user::{
    normalize_email, CurrentUser, DbUser, IssuedToken, RegisterMetadata, RegisteredUser, Session, User, UserProfile,
};
use crate::store;
use crate::utils::{ensure_password_strength, hash_password, non_blank, utc_now, verify_password};

pub use tokens::TokenPurpose;

/// Authenticated identity as seen by the rest of the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
}

#[derive(Clone, Copy)]
pub struct Identity<'a> {
    pool: &'a SqlitePool,
    jwt: &'a JwtConfig,
    config: &'a AppConfig,
}

impl<'a> Identity<'a> {
    pub fn new(pool: &'a SqlitePool, jwt: &'a JwtConfig, config: &'a AppConfig) -> Self {
        Self { pool, jwt, config }
    }

    /// Validates a bearer token: signature, expiry, and a live session.
    pub async fn authenticate(&self, token: &str) -> AppResult<AuthUser> {
        let claims = self.jwt.decode(token)?;

        let mut conn = self.pool.acquire().await?;
        let email = sessions::live_email(&mut conn, claims.sid, claims.sub)
            .await?
            .ok_or_else(|| AppError::unauthorized("Session has been revoked or does not exist"))?;

        Ok(AuthUser {
            user_id: claims.sub,
            email,
            session_id: claims.sid,
        })
    }

    /// Creates an unverified account with a `member` profile. The returned
    /// token is what a verification e-mail would carry.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        metadata: Option<RegisterMetadata>,
    ) -> AppResult<(RegisteredUser, IssuedToken)> {
        ensure_password_strength(password)?;
        let email = normalize_email(email)?;

        if store::users::find_by_email(self.pool, &email).await?.is_some() {
            return Err(AppError::conflict("Email is already registered"));
        }

        let password_hash = hash_password(password)?;
        let metadata = metadata.unwrap_or_default();
        let now = utc_now();
        let user_id = Uuid::new_v4();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, email_verified_at, created_at, updated_at) VALUES (?, ?, ?, NULL, ?, ?)",
        )
        .bind(user_id)
        .bind(&email)
        .bind(&password_hash)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::conflict("Email is already registered"),
            other => AppError::from(other),
        })?;

        let profile = UserProfile {
            user_id,
            full_name: non_blank(metadata.full_name.as_deref()),
            avatar_url: non_blank(metadata.avatar_url.as_deref()),
            role: PlatformRole::Member.as_str().to_string(),
            created_at: now,
        };

        sqlx::query("INSERT INTO user_profiles (user_id, full_name, avatar_url, role, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(profile.user_id)
            .bind(&profile.full_name)
            .bind(&profile.avatar_url)
            .bind(&profile.role)
            .bind(profile.created_at)
            .execute(&mut *tx)
            .await?;

        let token = tokens::issue(&mut tx, user_id, TokenPurpose::EmailVerification, self.config.action_token_hours).await?;

        tx.commit().await?;

        let user = User {
            id: user_id,
            email,
            email_verified: false,
            created_at: now,
        };

        Ok((RegisteredUser { user, profile }, IssuedToken { user_id, token }))
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<Session> {
        let invalid = || AppError::unauthorized("Invalid credentials");

        let email = normalize_email(email).map_err(|_| invalid())?;
        let user = store::users::find_by_email(self.pool, &email).await?.ok_or_else(invalid)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(invalid());
        }

        if self.config.require_email_verification && user.email_verified_at.is_none() {
            return Err(AppError::unauthorized("Email not confirmed"));
        }

        let mut conn = self.pool.acquire().await?;
        self.start_session(&mut conn, user).await
    }

    /// Exchanges a refresh token for a new session; the old one is revoked.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<Session> {
        let invalid = || AppError::unauthorized("Invalid or expired refresh token");

        let mut tx = self.pool.begin().await?;
        let user_id = sessions::rotate(&mut tx, refresh_token).await?.ok_or_else(invalid)?;

        let user = sqlx::query_as::<_, DbUser>(
            "SELECT id, email, password_hash, email_verified_at, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(invalid)?;

        let session = self.start_session(&mut tx, user).await?;
        tx.commit().await?;

        Ok(session)
    }

    pub async fn logout(&self, user: &AuthUser) -> AppResult<()> {
        let mut conn = self.pool.acquire().await?;
        sessions::revoke(&mut conn, user.session_id).await
    }

    pub async fn verify_email(&self, token: &str) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;
        let user_id = tokens::consume(&mut tx, token, TokenPurpose::EmailVerification).await?;

        let now = utc_now();
        sqlx::query("UPDATE users SET email_verified_at = COALESCE(email_verified_at, ?), updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(now)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let user = store::users::find_by_id(self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        Ok(user.into())
    }

    /// `None` when there is no such account; callers do not reveal that.
    pub async fn resend_verification(&self, email: &str) -> AppResult<Option<IssuedToken>> {
        let email = normalize_email(email)?;
        let Some(user) = store::users::find_by_email(self.pool, &email).await? else {
            return Ok(None);
        };

        if user.email_verified_at.is_some() {
            return Err(AppError::bad_request("Email is already verified"));
        }

        let mut conn = self.pool.acquire().await?;
        let token = tokens::issue(&mut conn, user.id, TokenPurpose::EmailVerification, self.config.action_token_hours).await?;

        Ok(Some(IssuedToken { user_id: user.id, token }))
    }

    /// `None` when there is no such account; callers do not reveal that.
    pub async fn forgot_password(&self, email: &str) -> AppResult<Option<IssuedToken>> {
        let email = normalize_email(email)?;
        let Some(user) = store::users::find_by_email(self.pool, &email).await? else {
            return Ok(None);
        };

        let mut conn = self.pool.acquire().await?;
        let token = tokens::issue(&mut conn, user.id, TokenPurpose::PasswordReset, self.config.action_token_hours).await?;

        Ok(Some(IssuedToken { user_id: user.id, token }))
    }

    /// Sets a new password and signs the user out everywhere.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<User> {
        ensure_password_strength(new_password)?;
        let password_hash = hash_password(new_password)?;

        let mut tx = self.pool.begin().await?;
        let user_id = tokens::consume(&mut tx, token, TokenPurpose::PasswordReset).await?;

        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(utc_now())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sessions::revoke_all(&mut tx, user_id, None).await?;
        tx.commit().await?;

        let user = store::users::find_by_id(self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        Ok(user.into())
    }

    /// Other sessions of the user are revoked; the calling one stays valid.
    pub async fn change_password(&self, caller: &AuthUser, old_password: &str, new_password: &str) -> AppResult<()> {
        ensure_password_strength(new_password)?;

        let user = store::users::find_by_id(self.pool, caller.user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;

        if !verify_password(old_password, &user.password_hash)? {
            return Err(AppError::unauthorized("The old password you provided is incorrect"));
        }

        let password_hash = hash_password(new_password)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(utc_now())
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        sessions::revoke_all(&mut tx, user.id, Some(caller.session_id)).await?;
        tx.commit().await?;

        Ok(())
    }

    pub async fn current_user(&self, caller: &AuthUser) -> AppResult<CurrentUser> {
        let user = store::users::find_by_id(self.pool, caller.user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User no longer exists"))?;
        let profile = store::users::find_profile(self.pool, caller.user_id).await?;

        Ok(CurrentUser {
            user: user.into(),
            profile: profile.map(UserProfile::from),
        })
    }

    async fn start_session(&self, conn: &mut sqlx::SqliteConnection, user: DbUser) -> AppResult<Session> {
        let session = sessions::open(conn, user.id, self.config.refresh_token_days).await?;

        let principal = Principal {
            id: user.id,
            email: user.email.clone(),
        };
        let access_token = self.jwt.encode(&principal, session.id)?;

        Ok(Session {
            access_token,
            refresh_token: session.refresh_token,
            token_type: "bearer".to_string(),
            expires_in: self.jwt.expires_in_secs(),
            user: user.into(),
        })
    }
}
