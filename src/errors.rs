use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::response::ApiResponse;

pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("{0}")]
    Token(String),
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn token(err: impl Into<String>) -> Self {
        Self::Token(err.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) | AppError::Token(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::Configuration(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Maps store failures onto HTTP semantics. Only "no row" and constraint
/// violations carry meaning; everything else is an infrastructure failure.
fn classify_sqlx_error(err: &sqlx::Error) -> StatusCode {
    match err {
        sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StatusCode::CONFLICT,
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let error = match status {
            StatusCode::BAD_REQUEST => "Validation error",
            StatusCode::UNAUTHORIZED => "Unauthorized",
            StatusCode::FORBIDDEN => "Forbidden",
            StatusCode::NOT_FOUND => "Not found",
            StatusCode::CONFLICT => "Conflict",
            _ => "Internal server error",
        };

        let message = match &self {
            AppError::Database(err) => match status {
                StatusCode::NOT_FOUND => "The requested resource does not exist".to_string(),
                StatusCode::CONFLICT => "The resource already exists".to_string(),
                _ => {
                    tracing::error!(error = %err, "database error");
                    "An unexpected error occurred".to_string()
                }
            },
            AppError::Internal(msg) | AppError::Configuration(msg) => {
                tracing::error!(error = %msg, "internal error");
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiResponse::<()>::failure(error, message))).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(AppError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::token("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(AppError::internal("x").status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::Database(sqlx::Error::RowNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database(sqlx::Error::PoolTimedOut).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn error_body_uses_envelope() {
        let response = AppError::forbidden("You do not have access to this project").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Forbidden");
        assert_eq!(body["message"], "You do not have access to this project");
        assert!(body.get("data").is_none());
    }
}
