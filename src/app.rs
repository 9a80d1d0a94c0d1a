use std::sync::Arc;

use axum::http::{HeaderValue, Method, Uri};
use axum::routing::{get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{app_port, AppConfig};
use crate::docs;
use crate::errors::AppError;
use crate::identity::Identity;
use crate::jwt::JwtConfig;
use crate::routes::{auth, health, members, notes, projects, subtasks, tasks};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, config: AppConfig) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }

    pub fn identity(&self) -> Identity<'_> {
        Identity::new(&self.pool, &self.jwt, &self.config)
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let config = AppConfig::from_env()?;
    let jwt_config = JwtConfig::from_env()?;
    create_app_with(pool, config, jwt_config)
}

pub fn create_app_with(pool: SqlitePool, config: AppConfig, jwt: JwtConfig) -> Result<Router, AppError> {
    let cors = cors_layer(&config.allowed_origins)?;
    let state = AppState::new(pool, jwt, config);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh-token", post(auth::refresh_token))
        .route("/verify-email/:token", get(auth::verify_email))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password/:token", post(auth::reset_password))
        .route("/logout", post(auth::logout))
        .route("/current-user", get(auth::current_user))
        .route("/change-password", post(auth::change_password))
        .route("/resend-email-verification", post(auth::resend_email_verification));

    let project_routes = Router::new()
        .route("/", get(projects::list_projects).post(projects::create_project))
        .route(
            "/:project_id",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/:project_id/members", get(members::list_members).post(members::add_member))
        .route(
            "/:project_id/members/:user_id",
            put(members::update_member).delete(members::remove_member),
        );

    // Tasks and subtasks are scoped to a project: /tasks/:project_id/...
    let task_routes = Router::new()
        .route("/:project_id", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/:project_id/t/:task_id",
            get(tasks::get_task).put(tasks::update_task).delete(tasks::delete_task),
        )
        .route(
            "/:project_id/t/:task_id/subtasks",
            get(subtasks::list_subtasks).post(subtasks::create_subtask),
        )
        .route(
            "/:project_id/st/:subtask_id",
            put(subtasks::update_subtask).delete(subtasks::delete_subtask),
        );

    let note_routes = Router::new()
        .route("/:project_id", get(notes::list_notes).post(notes::create_note))
        .route(
            "/:project_id/n/:note_id",
            get(notes::get_note).put(notes::update_note).delete(notes::delete_note),
        );

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes)
        .nest("/notes", note_routes)
        .route("/healthcheck", get(health::healthcheck));

    let openapi = docs::build_openapi(app_port())?;

    let router = Router::new()
        .nest("/api/v1", api)
        .fallback(route_not_found)
        .with_state(state)
        .merge(docs::swagger_routes(openapi)?)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}

async fn route_not_found(method: Method, uri: Uri) -> AppError {
    AppError::not_found(format!("Route {} {} not found", method, uri.path()))
}

fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, AppError> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if allowed_origins.is_empty() {
        return Ok(cors.allow_origin(Any));
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| AppError::configuration(format!("invalid origin in ALLOWED_ORIGINS: {origin}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(cors.allow_origin(AllowOrigin::list(origins)))
}
