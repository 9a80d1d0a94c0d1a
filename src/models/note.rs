use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::utils::double_option;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Note {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub content: String,
    #[schema(example = "meeting")]
    pub category: Option<String>,
    #[schema(example = json!(["launch", "marketing"]))]
    pub tags: Vec<String>,
    pub is_pinned: bool,
    pub is_decision: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbNote {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Json<Vec<String>>,
    pub is_pinned: bool,
    pub is_decision: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbNote> for Note {
    fn from(value: DbNote) -> Self {
        Note {
            id: value.id,
            project_id: value.project_id,
            title: value.title,
            content: value.content,
            category: value.category,
            tags: value.tags.0,
            is_pinned: value.is_pinned,
            is_decision: value.is_decision,
            created_by: value.created_by,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NoteCreateRequest {
    #[schema(example = "Kickoff decisions")]
    pub title: Option<String>,
    #[schema(example = "We ship the beta to 50 customers first.")]
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
    pub is_decision: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct NoteUpdateRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub category: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
    pub is_pinned: Option<bool>,
    pub is_decision: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NoteListQuery {
    pub category: Option<String>,
    pub is_pinned: Option<bool>,
    pub is_decision: Option<bool>,
}

/// Tags behave as a set: blanks are dropped and repeats keep their first position.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !seen.iter().any(|existing: &String| existing == tag) {
            seen.push(tag.to_string());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_deduplicated_in_order() {
        let tags = vec!["b".into(), " a ".into(), "b".into(), "".into(), "a".into()];
        assert_eq!(normalize_tags(tags), vec!["b".to_string(), "a".to_string()]);
    }
}
