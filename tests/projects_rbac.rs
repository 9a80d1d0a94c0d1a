mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::TestApp;
use project_desk::authz::ProjectRole;
use project_desk::config::AppConfig;

#[tokio::test]
async fn creator_needs_a_membership_unless_auto_enrolled() -> Result<()> {
    let app = TestApp::spawn().await?;
    let maker = app.user("maker@example.com").await?;

    let reply = app.post("/api/v1/projects", &maker.token, json!({ "name": "Orphan" })).await?;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert_eq!(reply.data()["status"], "active");
    assert_eq!(reply.data()["created_by"], maker.id.to_string());
    let project_id = reply.id()?;

    let reply = app.get(&format!("/api/v1/projects/{}", project_id), &maker.token).await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.message(), "You do not have access to this project");

    let config = AppConfig {
        auto_enroll_project_creator: true,
        ..AppConfig::default()
    };
    let app = TestApp::with_config(config).await?;
    let maker = app.user("maker@example.com").await?;

    let reply = app.post("/api/v1/projects", &maker.token, json!({ "name": "Adopted" })).await?;
    let project_id = reply.id()?;

    let reply = app.get(&format!("/api/v1/projects/{}", project_id), &maker.token).await?;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.data()["name"], "Adopted");
    assert_eq!(reply.data()["access"]["project_role"], "owner");
    assert_eq!(reply.data()["access"]["platform_role"], "member");

    Ok(())
}

#[tokio::test]
async fn project_name_is_required() -> Result<()> {
    let app = TestApp::spawn().await?;
    let user = app.user("blank@example.com").await?;

    let reply = app.post("/api/v1/projects", &user.token, json!({ "name": "   " })).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.message(), "Project name is required");

    Ok(())
}

#[tokio::test]
async fn listing_is_scoped_to_memberships_except_for_admins() -> Result<()> {
    let app = TestApp::spawn().await?;
    let admin = app.admin("root@example.com").await?;
    let alice = app.user("alice@example.com").await?;
    let bob = app.user("bob@example.com").await?;

    let first = app.project_owned_by(&admin, &alice, "Alpha").await?;
    let second = app.project_owned_by(&admin, &bob, "Beta").await?;

    let reply = app.get("/api/v1/projects", &admin.token).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["count"], 2);
    // newest first
    assert_eq!(reply.data()[0]["id"], second.to_string());
    assert_eq!(reply.data()[1]["id"], first.to_string());

    let reply = app.get("/api/v1/projects", &alice.token).await?;
    assert_eq!(reply.body["count"], 1);
    assert_eq!(reply.data()[0]["name"], "Alpha");

    let reply = app.get(&format!("/api/v1/projects/{}", second), &alice.token).await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn role_ladder_is_enforced() -> Result<()> {
    let app = TestApp::spawn().await?;
    let admin = app.admin("root@example.com").await?;
    let owner = app.user("owner@example.com").await?;
    let member = app.user("member@example.com").await?;
    let viewer = app.user("viewer@example.com").await?;

    let project_id = app.project_owned_by(&admin, &owner, "Ladder").await?;
    app.enroll(project_id, member.id, ProjectRole::Member).await?;
    app.enroll(project_id, viewer.id, ProjectRole::Viewer).await?;

    let project_uri = format!("/api/v1/projects/{}", project_id);
    let tasks_uri = format!("/api/v1/tasks/{}", project_id);

    // viewers read but do not write
    assert_eq!(app.get(&project_uri, &viewer.token).await?.status, StatusCode::OK);
    let reply = app.post(&tasks_uri, &viewer.token, json!({ "title": "Nope" })).await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.message(), "You do not have write access to this project");

    // members write content but do not manage the project
    let reply = app.post(&tasks_uri, &member.token, json!({ "title": "Yes" })).await?;
    assert_eq!(reply.status, StatusCode::CREATED);
    let reply = app.get(&tasks_uri, &viewer.token).await?;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.body["count"], 1);
    assert_eq!(reply.data()[0]["title"], "Yes");
    let reply = app.put(&project_uri, &member.token, json!({ "name": "Renamed" })).await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.message(), "Only project owners and admins can perform this action");

    let reply = app.put(&project_uri, &owner.token, json!({ "name": "Renamed", "description": null })).await?;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.data()["name"], "Renamed");
    assert!(reply.data()["description"].is_null());

    let reply = app.put(&project_uri, &owner.token, json!({})).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.message(), "No valid fields to update");

    Ok(())
}

#[tokio::test]
async fn admins_act_as_owners_everywhere() -> Result<()> {
    let app = TestApp::spawn().await?;
    let admin = app.admin("root@example.com").await?;
    let owner = app.user("owner@example.com").await?;

    let project_id = app.project_owned_by(&admin, &owner, "Managed").await?;

    let reply = app.get(&format!("/api/v1/projects/{}", project_id), &admin.token).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data()["access"]["platform_role"], "platform_admin");
    assert_eq!(reply.data()["access"]["project_role"], "owner");

    let reply = app.get(&format!("/api/v1/projects/{}", Uuid::new_v4()), &admin.token).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.message(), "Project not found");

    Ok(())
}

#[tokio::test]
async fn malformed_project_id_is_a_validation_error() -> Result<()> {
    let app = TestApp::spawn().await?;
    let user = app.user("typo@example.com").await?;

    let reply = app.get("/api/v1/projects/not-a-uuid", &user.token).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.message(), "Invalid project id");

    Ok(())
}

#[tokio::test]
async fn deleting_a_project_removes_its_content() -> Result<()> {
    let app = TestApp::spawn().await?;
    let admin = app.admin("root@example.com").await?;
    let owner = app.user("owner@example.com").await?;

    let project_id = app.project_owned_by(&admin, &owner, "Doomed").await?;
    let reply = app
        .post(&format!("/api/v1/tasks/{}", project_id), &owner.token, json!({ "title": "Task" }))
        .await?;
    assert_eq!(reply.status, StatusCode::CREATED);

    let reply = app.delete(&format!("/api/v1/projects/{}", project_id), &owner.token).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.message(), "Project deleted successfully");

    let tasks_left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE project_id = ?")
        .bind(project_id)
        .fetch_one(&app.pool)
        .await?;
    assert_eq!(tasks_left, 0);

    // the owner's membership went with the project
    let reply = app.get(&format!("/api/v1/projects/{}", project_id), &owner.token).await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = app.delete(&format!("/api/v1/projects/{}", project_id), &admin.token).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    Ok(())
}
