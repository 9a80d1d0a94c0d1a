use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::AccessGrant;
use crate::utils::double_option;

pub const DEFAULT_PROJECT_STATUS: &str = "active";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "active")]
    pub status: String,
    pub created_by: Uuid,
    pub start_date: Option<NaiveDate>,
    pub target_end_date: Option<NaiveDate>,
    pub actual_end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Single project together with the caller's resolved roles.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub access: AccessGrant,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProjectCreateRequest {
    #[schema(example = "Launch Planning")]
    pub name: Option<String>,
    #[schema(example = "Prepare milestones for the product launch.")]
    pub description: Option<String>,
    #[schema(example = "active")]
    pub status: Option<String>,
    #[schema(example = "2025-01-06")]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2025-03-31")]
    pub target_end_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProjectUpdateRequest {
    #[schema(example = "Launch Planning")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, example = "Updated description")]
    pub description: Option<Option<String>>,
    #[schema(example = "completed")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub target_end_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveDate>, example = "2025-03-28")]
    pub actual_end_date: Option<Option<NaiveDate>>,
}
