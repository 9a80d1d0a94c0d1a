use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::AppError;
use crate::identity::Principal;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Arc<Vec<u8>>,
    pub exp_minutes: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<Vec<u8>>, exp_minutes: i64) -> Self {
        Self {
            secret: Arc::new(secret.into()),
            exp_minutes,
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET").map_err(|_| AppError::configuration("JWT_SECRET not set"))?;
        let exp_minutes = std::env::var("JWT_EXP_MINUTES")
            .map(|val| val.parse::<i64>())
            .unwrap_or(Ok(60))
            .map_err(|_| AppError::configuration("JWT_EXP_MINUTES must be a valid integer"))?;

        Ok(Self::new(secret.into_bytes(), exp_minutes))
    }

    pub fn expires_in_secs(&self) -> i64 {
        self.exp_minutes * 60
    }

    pub fn encode(&self, principal: &Principal, session_id: Uuid) -> Result<String, AppError> {
        use chrono::{Duration, Utc};

        let now = Utc::now();
        let exp = now + Duration::minutes(self.exp_minutes);

        let claims = Claims {
            sub: principal.id,
            email: principal.email.clone(),
            sid: session_id,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|err| AppError::token(err.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|_| AppError::token("Invalid or expired token"))
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    /// Session the token was minted for; revoked on logout.
    pub sid: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// Authenticated caller. Extracting it validates the bearer token against the
/// identity store, so a logged-out session is rejected even before expiry.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub session_id: Uuid,
}

pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::unauthorized("Missing or invalid authorization header"))?;

        state.identity().authenticate(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_principal_and_session() {
        let jwt = JwtConfig::new("unit-secret", 5);
        let principal = Principal {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
        };
        let sid = Uuid::new_v4();

        let token = jwt.encode(&principal, sid).unwrap();
        let claims = jwt.decode(&token).unwrap();

        assert_eq!(claims.sub, principal.id);
        assert_eq!(claims.email, principal.email);
        assert_eq!(claims.sid, sid);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let principal = Principal {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
        };
        let token = JwtConfig::new("one", 5).encode(&principal, Uuid::new_v4()).unwrap();

        let err = JwtConfig::new("two", 5).decode(&token).unwrap_err();
        assert!(matches!(err, AppError::Token(_)));
    }
}
