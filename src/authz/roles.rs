use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::AppError;

/// Platform-wide role stored on the user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlatformRole {
    Member,
    PlatformAdmin,
}

impl PlatformRole {
    /// `admin` and `platform_admin` are synonyms. Anything unrecognised is a
    /// plain member; profile rows never fail to load because of their role.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" | "platform_admin" => PlatformRole::PlatformAdmin,
            _ => PlatformRole::Member,
        }
    }

    /// Strict variant used by the operator CLI. Only exact literals match.
    pub fn parse_strict(value: &str) -> Option<Self> {
        match value {
            "admin" | "platform_admin" => Some(PlatformRole::PlatformAdmin),
            "member" => Some(PlatformRole::Member),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformRole::Member => "member",
            PlatformRole::PlatformAdmin => "platform_admin",
        }
    }
}

/// Role of a user inside one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectRole {
    Owner,
    ProjectAdmin,
    Member,
    Viewer,
}

impl ProjectRole {
    pub const ALL: [ProjectRole; 4] = [
        ProjectRole::Owner,
        ProjectRole::ProjectAdmin,
        ProjectRole::Member,
        ProjectRole::Viewer,
    ];

    /// Accepts exactly the five literals clients may send; `admin` maps to
    /// `project_admin`. Case and surrounding whitespace are significant.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "owner" => Some(ProjectRole::Owner),
            "project_admin" | "admin" => Some(ProjectRole::ProjectAdmin),
            "member" => Some(ProjectRole::Member),
            "viewer" => Some(ProjectRole::Viewer),
            _ => None,
        }
    }

    /// Like [`ProjectRole::parse`] but yields the validation error returned to clients.
    pub fn from_input(value: &str) -> Result<Self, AppError> {
        Self::parse(value).ok_or_else(|| {
            AppError::bad_request("Invalid role. Must be one of: owner, project_admin, admin, member, viewer")
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Owner => "owner",
            ProjectRole::ProjectAdmin => "project_admin",
            ProjectRole::Member => "member",
            ProjectRole::Viewer => "viewer",
        }
    }

    pub fn can_write(&self) -> bool {
        matches!(self, ProjectRole::Owner | ProjectRole::ProjectAdmin | ProjectRole::Member)
    }

    pub fn can_manage(&self) -> bool {
        matches!(self, ProjectRole::Owner | ProjectRole::ProjectAdmin)
    }
}

/// Privilege a route demands, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccessClass {
    ProjectAccess,
    ProjectWrite,
    ProjectOwner,
    PlatformAdmin,
}

impl AccessClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessClass::ProjectAccess => "project_access",
            AccessClass::ProjectWrite => "project_write",
            AccessClass::ProjectOwner => "project_owner",
            AccessClass::PlatformAdmin => "platform_admin",
        }
    }

    /// Whether a member holding `role` satisfies this class.
    pub fn admits(&self, role: ProjectRole) -> bool {
        match self {
            AccessClass::ProjectAccess => true,
            AccessClass::ProjectWrite => role.can_write(),
            AccessClass::ProjectOwner => role.can_manage(),
            AccessClass::PlatformAdmin => false,
        }
    }

    pub fn denial_message(&self) -> &'static str {
        match self {
            AccessClass::ProjectAccess => "You do not have access to this project",
            AccessClass::ProjectWrite => "You do not have write access to this project",
            AccessClass::ProjectOwner => "Only project owners and admins can perform this action",
            AccessClass::PlatformAdmin => "Platform admin privileges are required",
        }
    }
}

/// Roles resolved for the caller on an allowed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct AccessGrant {
    pub platform_role: PlatformRole,
    pub project_role: ProjectRole,
}
