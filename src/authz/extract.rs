use std::collections::HashMap;
use std::marker::PhantomData;

use axum::async_trait;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use uuid::Uuid;

use super::evaluator::resolve;
use super::roles::{AccessClass, AccessGrant};
use crate::app::AppState;
use crate::errors::AppError;
use crate::jwt::AuthUser;

/// Marker naming the access class a handler demands.
pub trait Requirement: Send + Sync + 'static {
    const CLASS: AccessClass;
}

/// Any member of the project, viewers included.
pub struct Access;
/// Members who may modify project content.
pub struct Write;
/// Owners and project admins.
pub struct Own;

impl Requirement for Access {
    const CLASS: AccessClass = AccessClass::ProjectAccess;
}

impl Requirement for Write {
    const CLASS: AccessClass = AccessClass::ProjectWrite;
}

impl Requirement for Own {
    const CLASS: AccessClass = AccessClass::ProjectOwner;
}

/// Caller authenticated and authorized for the `:project_id` in the path.
pub struct Authorized<R: Requirement> {
    pub user: AuthUser,
    pub project_id: Uuid,
    pub grant: AccessGrant,
    _requirement: PhantomData<R>,
}

impl<R: Requirement> std::fmt::Debug for Authorized<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorized")
            .field("user_id", &self.user.user_id)
            .field("project_id", &self.project_id)
            .field("class", &R::CLASS)
            .field("grant", &self.grant)
            .finish()
    }
}

#[async_trait]
impl<R: Requirement> FromRequestParts<AppState> for Authorized<R> {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let project_id = project_id_from_path(parts, state).await?;

        let grant = resolve(&state.pool, user.user_id, Some(project_id), R::CLASS).await?;

        Ok(Self {
            user,
            project_id,
            grant,
            _requirement: PhantomData,
        })
    }
}

async fn project_id_from_path(parts: &mut Parts, state: &AppState) -> Result<Uuid, AppError> {
    let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .map_err(|_| AppError::bad_request("Project ID is required"))?;

    let raw = params
        .get("project_id")
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::bad_request("Project ID is required"))?;

    parse_id(raw, "project")
}

/// Parses a path identifier, reporting malformed values as validation errors.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::bad_request(format!("Invalid {what} id")))
}
