mod common;

use anyhow::Result;
use axum::http::StatusCode;

use common::TestApp;

#[tokio::test]
async fn health_endpoint_reports_db_ok() -> Result<()> {
    let app = TestApp::spawn().await?;

    let reply = app.request("GET", "/api/v1/healthcheck", None, None).await?;
    assert_eq!(reply.status, StatusCode::OK, "health endpoint did not return 200");
    assert_eq!(reply.body["success"], true);
    assert_eq!(reply.message(), "Server is running");
    assert_eq!(reply.data()["db_ok"], true, "expected db_ok: true, got: {}", reply.body);

    Ok(())
}

#[tokio::test]
async fn unknown_route_gets_the_error_envelope() -> Result<()> {
    let app = TestApp::spawn().await?;

    let reply = app.request("GET", "/api/v1/nowhere", None, None).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["success"], false);
    assert_eq!(reply.body["error"], "Not found");
    assert_eq!(reply.message(), "Route GET /api/v1/nowhere not found");

    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() -> Result<()> {
    let app = TestApp::spawn().await?;

    let reply = app.request("GET", "/api/v1/projects", None, None).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.message(), "Missing or invalid authorization header");

    let reply = app.get("/api/v1/projects", "not-a-jwt").await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["error"], "Unauthorized");

    Ok(())
}
