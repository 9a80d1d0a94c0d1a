use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::subtask::Subtask;
use crate::utils::double_option;

pub const DEFAULT_TASK_STATUS: &str = "todo";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "todo")]
    pub status: String,
    #[schema(example = "high")]
    pub priority: Option<String>,
    pub is_critical: bool,
    pub assigned_to: Option<Uuid>,
    pub created_by: Uuid,
    pub goal: Option<String>,
    pub expected_outcome: Option<String>,
    pub definition_of_done: Option<String>,
    #[schema(format = DateTime, example = "2025-10-10T10:00:00Z")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TaskWithSubtasks {
    #[serde(flatten)]
    pub task: Task,
    pub subtasks: Vec<Subtask>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TaskCreateRequest {
    #[schema(example = "Define launch checklist")]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(example = "todo")]
    pub status: Option<String>,
    #[schema(example = "high")]
    pub priority: Option<String>,
    pub is_critical: Option<bool>,
    pub assigned_to: Option<Uuid>,
    #[schema(example = "Everyone knows what ships on launch day")]
    pub goal: Option<String>,
    pub expected_outcome: Option<String>,
    pub definition_of_done: Option<String>,
    #[schema(format = DateTime, example = "2025-10-10T10:00:00Z")]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TaskUpdateRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[schema(example = "in_progress")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub priority: Option<Option<String>>,
    pub is_critical: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub assigned_to: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub goal: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub expected_outcome: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub definition_of_done: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>, format = DateTime, example = "2025-11-01T10:00:00Z")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskListQuery {
    pub status: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub priority: Option<String>,
}
