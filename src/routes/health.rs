use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::query_scalar;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::response::ApiResponse;
use crate::utils::utc_now;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub db_ok: bool,
    pub db_error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[utoipa::path(
    get,
    path = "/api/v1/healthcheck",
    tag = "Health",
    security(()),
    responses((status = 200, description = "Server is running", body = HealthStatus))
)]
pub async fn healthcheck(State(state): State<AppState>) -> AppResult<Json<ApiResponse<HealthStatus>>> {
    // Lightweight DB probe; a failure is reported, not raised
    let db_check = query_scalar::<_, i64>("SELECT 1").fetch_one(&state.pool).await;

    let status = match db_check {
        Ok(_) => HealthStatus { status: "ok".into(), db_ok: true, db_error: None, timestamp: utc_now() },
        Err(e) => {
            tracing::warn!(error = %e, "database probe failed");
            HealthStatus { status: "degraded".into(), db_ok: false, db_error: Some(e.to_string()), timestamp: utc_now() }
        }
    };

    Ok(ApiResponse::ok_with_message(status, "Server is running"))
}
