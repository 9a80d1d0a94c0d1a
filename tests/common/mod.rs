#![allow(dead_code)]

use std::path::Path;

use anyhow::{Context, Result};
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

use project_desk::authz::ProjectRole;
use project_desk::config::AppConfig;
use project_desk::create_app_with;
use project_desk::identity::Identity;
use project_desk::jwt::JwtConfig;
use project_desk::store::members;

pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub config: AppConfig,
    pub jwt: JwtConfig,
    // keeps the database file alive for the duration of the test
    _dir: TempDir,
}

pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn id(&self) -> Result<Uuid> {
        let raw = self.body["data"]["id"].as_str().context("missing data.id")?;
        Ok(Uuid::parse_str(raw)?)
    }

    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
    pub refresh_token: String,
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        Self::with_config(AppConfig::default()).await
    }

    pub async fn with_config(config: AppConfig) -> Result<Self> {
        let dir = tempfile::tempdir().context("failed to create tempdir")?;
        let db_path = dir.path().join("test.db");

        let opts = SqliteConnectOptions::new()
            .filename(db_path.as_path())
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePool::connect_with(opts).await?;

        let migrator = sqlx::migrate::Migrator::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
        migrator.run(&pool).await?;

        let jwt = JwtConfig::new("test-secret", 60);
        let app = create_app_with(pool.clone(), config.clone(), jwt.clone())?;

        Ok(Self { app, pool, config, jwt, _dir: dir })
    }

    pub fn identity(&self) -> Identity<'_> {
        Identity::new(&self.pool, &self.jwt, &self.config)
    }

    pub async fn request(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<Reply> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let req = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let resp = self.app.clone().oneshot(req).await?;
        let status = resp.status();
        let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .with_context(|| format!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))?
        };

        Ok(Reply { status, body })
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<Reply> {
        self.request("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Result<Reply> {
        self.request("POST", uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> Result<Reply> {
        self.request("PUT", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Result<Reply> {
        self.request("DELETE", uri, Some(token), None).await
    }

    /// Registers and logs in a fresh account.
    pub async fn user(&self, email: &str) -> Result<TestUser> {
        let reply = self
            .request(
                "POST",
                "/api/v1/auth/register",
                None,
                Some(serde_json::json!({ "email": email, "password": PASSWORD })),
            )
            .await?;
        if reply.status != StatusCode::CREATED {
            anyhow::bail!("register failed: {} - {}", reply.status, reply.body);
        }

        self.login(email, PASSWORD).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TestUser> {
        let reply = self
            .request(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(serde_json::json!({ "email": email, "password": password })),
            )
            .await?;
        if reply.status != StatusCode::OK {
            anyhow::bail!("login failed: {} - {}", reply.status, reply.body);
        }

        let data = reply.data();
        Ok(TestUser {
            id: Uuid::parse_str(data["user"]["id"].as_str().context("missing user id")?)?,
            email: email.to_string(),
            token: data["access_token"].as_str().context("missing access token")?.to_string(),
            refresh_token: data["refresh_token"].as_str().context("missing refresh token")?.to_string(),
        })
    }

    /// Registers an account and promotes it to platform admin.
    pub async fn admin(&self, email: &str) -> Result<TestUser> {
        let user = self.user(email).await?;
        sqlx::query("UPDATE user_profiles SET role = 'platform_admin' WHERE user_id = ?")
            .bind(user.id)
            .execute(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn enroll(&self, project_id: Uuid, user_id: Uuid, role: ProjectRole) -> Result<()> {
        members::insert(&self.pool, project_id, user_id, role, user_id).await?;
        Ok(())
    }

    /// Creates a project as `admin` and enrolls `owner` as its owner.
    pub async fn project_owned_by(&self, admin: &TestUser, owner: &TestUser, name: &str) -> Result<Uuid> {
        let reply = self
            .post("/api/v1/projects", &admin.token, serde_json::json!({ "name": name }))
            .await?;
        if reply.status != StatusCode::CREATED {
            anyhow::bail!("project create failed: {} - {}", reply.status, reply.body);
        }

        let project_id = reply.id()?;
        self.enroll(project_id, owner.id, ProjectRole::Owner).await?;
        Ok(project_id)
    }
}
