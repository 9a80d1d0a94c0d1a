use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Subtask {
    pub id: Uuid,
    pub task_id: Uuid,
    pub title: String,
    pub is_completed: bool,
    pub order_index: i64,
    pub ai_generated: bool,
    /// Set when the subtask is marked complete, cleared when reopened.
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubtaskCreateRequest {
    #[schema(example = "Draft announcement copy")]
    pub title: Option<String>,
    #[schema(example = 0)]
    pub order_index: Option<i64>,
    pub ai_generated: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SubtaskUpdateRequest {
    pub title: Option<String>,
    pub is_completed: Option<bool>,
    #[schema(example = 2)]
    pub order_index: Option<i64>,
}
