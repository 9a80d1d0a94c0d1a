use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::roles::{AccessClass, AccessGrant, PlatformRole, ProjectRole};
use crate::errors::AppError;

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    #[error("User profile could not be retrieved")]
    ProfileNotFound,
    #[error("You do not have access to this project")]
    NoProjectAccess,
    #[error("{}", .0.denial_message())]
    InsufficientPrivilege(AccessClass),
    #[error("role lookup failed: {0}")]
    StoreUnavailable(String),
}

impl From<AuthzError> for AppError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::StoreUnavailable(msg) => AppError::internal(msg),
            denied => AppError::forbidden(denied.to_string()),
        }
    }
}

/// Where the engine reads roles from. `Ok(None)` means "no such row";
/// `Err` is reserved for infrastructure failures.
#[async_trait]
pub trait RoleSource: Send + Sync {
    async fn platform_role(&self, user_id: Uuid) -> Result<Option<PlatformRole>, AuthzError>;

    async fn project_role(&self, project_id: Uuid, user_id: Uuid) -> Result<Option<ProjectRole>, AuthzError>;
}

#[async_trait]
impl RoleSource for SqlitePool {
    async fn platform_role(&self, user_id: Uuid) -> Result<Option<PlatformRole>, AuthzError> {
        let role = sqlx::query_scalar::<_, String>("SELECT role FROM user_profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(self)
            .await
            .map_err(|err| AuthzError::StoreUnavailable(err.to_string()))?;

        Ok(role.as_deref().map(PlatformRole::parse))
    }

    async fn project_role(&self, project_id: Uuid, user_id: Uuid) -> Result<Option<ProjectRole>, AuthzError> {
        let role = sqlx::query_scalar::<_, String>(
            "SELECT role FROM project_members WHERE project_id = ? AND user_id = ?",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(self)
        .await
        .map_err(|err| AuthzError::StoreUnavailable(err.to_string()))?;

        // The column is CHECK-constrained; an unparseable value counts as no membership.
        Ok(role.as_deref().and_then(ProjectRole::parse))
    }
}

/// Decides whether `user_id` may perform an operation of class `required` on
/// `project_id`.
///
/// Platform admins are allowed everything and act as project owners. For
/// everyone else the platform-admin class is denied outright, and project
/// classes require a membership row whose role satisfies the class.
/// `project_id` is `None` only for checks that are not tied to a project.
pub async fn resolve<S>(
    source: &S,
    user_id: Uuid,
    project_id: Option<Uuid>,
    required: AccessClass,
) -> Result<AccessGrant, AuthzError>
where
    S: RoleSource + ?Sized,
{
    let platform_role = source
        .platform_role(user_id)
        .await?
        .ok_or(AuthzError::ProfileNotFound)?;

    if platform_role == PlatformRole::PlatformAdmin {
        tracing::debug!(
            user_id = %user_id,
            project_id = ?project_id,
            class = required.as_str(),
            "platform admin bypass"
        );
        return Ok(AccessGrant {
            platform_role,
            project_role: ProjectRole::Owner,
        });
    }

    if required == AccessClass::PlatformAdmin {
        tracing::debug!(user_id = %user_id, class = required.as_str(), "access denied");
        return Err(AuthzError::InsufficientPrivilege(required));
    }

    let project_id = project_id.ok_or(AuthzError::NoProjectAccess)?;
    let project_role = match source.project_role(project_id, user_id).await? {
        Some(role) => role,
        None => {
            tracing::debug!(
                user_id = %user_id,
                project_id = %project_id,
                class = required.as_str(),
                "access denied: not a member"
            );
            return Err(AuthzError::NoProjectAccess);
        }
    };

    if !required.admits(project_role) {
        tracing::debug!(
            user_id = %user_id,
            project_id = %project_id,
            class = required.as_str(),
            role = project_role.as_str(),
            "access denied: insufficient role"
        );
        return Err(AuthzError::InsufficientPrivilege(required));
    }

    tracing::debug!(
        user_id = %user_id,
        project_id = %project_id,
        class = required.as_str(),
        role = project_role.as_str(),
        "access granted"
    );

    Ok(AccessGrant {
        platform_role,
        project_role,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    struct MemorySource {
        profiles: HashMap<Uuid, PlatformRole>,
        members: HashMap<(Uuid, Uuid), ProjectRole>,
        broken: bool,
    }

    #[async_trait]
    impl RoleSource for MemorySource {
        async fn platform_role(&self, user_id: Uuid) -> Result<Option<PlatformRole>, AuthzError> {
            if self.broken {
                return Err(AuthzError::StoreUnavailable("connection reset".into()));
            }
            Ok(self.profiles.get(&user_id).copied())
        }

        async fn project_role(&self, project_id: Uuid, user_id: Uuid) -> Result<Option<ProjectRole>, AuthzError> {
            Ok(self.members.get(&(project_id, user_id)).copied())
        }
    }

    const PROJECT_CLASSES: [AccessClass; 3] = [
        AccessClass::ProjectAccess,
        AccessClass::ProjectWrite,
        AccessClass::ProjectOwner,
    ];

    #[tokio::test]
    async fn platform_admin_passes_every_class_without_membership() {
        let admin = Uuid::new_v4();
        let mut source = MemorySource::default();
        source.profiles.insert(admin, PlatformRole::PlatformAdmin);

        for class in PROJECT_CLASSES.into_iter().chain([AccessClass::PlatformAdmin]) {
            let grant = resolve(&source, admin, Some(Uuid::new_v4()), class).await.unwrap();
            assert_eq!(grant.project_role, ProjectRole::Owner);
            assert_eq!(grant.platform_role, PlatformRole::PlatformAdmin);
        }
    }

    #[tokio::test]
    async fn non_member_is_denied_every_project_class() {
        let user = Uuid::new_v4();
        let mut source = MemorySource::default();
        source.profiles.insert(user, PlatformRole::Member);

        for class in PROJECT_CLASSES {
            let err = resolve(&source, user, Some(Uuid::new_v4()), class).await.unwrap_err();
            assert!(matches!(err, AuthzError::NoProjectAccess), "{class:?}: {err:?}");
        }
    }

    #[tokio::test]
    async fn missing_profile_is_denied() {
        let source = MemorySource::default();
        let err = resolve(&source, Uuid::new_v4(), Some(Uuid::new_v4()), AccessClass::ProjectAccess)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::ProfileNotFound));
        assert_eq!(AppError::from(err).status(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn member_is_not_platform_admin() {
        let user = Uuid::new_v4();
        let project = Uuid::new_v4();
        let mut source = MemorySource::default();
        source.profiles.insert(user, PlatformRole::Member);
        source.members.insert((project, user), ProjectRole::Owner);

        let err = resolve(&source, user, Some(project), AccessClass::PlatformAdmin)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::InsufficientPrivilege(AccessClass::PlatformAdmin)));
    }

    #[tokio::test]
    async fn decisions_follow_role_ordering() {
        let user = Uuid::new_v4();
        let project = Uuid::new_v4();

        for role in ProjectRole::ALL {
            let mut source = MemorySource::default();
            source.profiles.insert(user, PlatformRole::Member);
            source.members.insert((project, user), role);

            let access = resolve(&source, user, Some(project), AccessClass::ProjectAccess).await.is_ok();
            let write = resolve(&source, user, Some(project), AccessClass::ProjectWrite).await.is_ok();
            let owner = resolve(&source, user, Some(project), AccessClass::ProjectOwner).await.is_ok();

            assert!(access, "{role:?} must have access");
            assert!(!owner || write, "{role:?}: owner without write");
            assert!(!write || access, "{role:?}: write without access");
            assert_eq!(write, role != ProjectRole::Viewer, "{role:?}");
            assert_eq!(
                owner,
                matches!(role, ProjectRole::Owner | ProjectRole::ProjectAdmin),
                "{role:?}"
            );
        }
    }

    #[tokio::test]
    async fn store_failure_is_not_a_denial() {
        let source = MemorySource {
            broken: true,
            ..Default::default()
        };
        let err = resolve(&source, Uuid::new_v4(), Some(Uuid::new_v4()), AccessClass::ProjectAccess)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::StoreUnavailable(_)));
        assert_eq!(
            AppError::from(err).status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn grant_carries_member_role() {
        let user = Uuid::new_v4();
        let project = Uuid::new_v4();
        let mut source = MemorySource::default();
        source.profiles.insert(user, PlatformRole::Member);
        source.members.insert((project, user), ProjectRole::Viewer);

        let grant = resolve(&source, user, Some(project), AccessClass::ProjectAccess).await.unwrap();
        assert_eq!(grant.project_role, ProjectRole::Viewer);
        assert_eq!(grant.platform_role, PlatformRole::Member);
    }
}
