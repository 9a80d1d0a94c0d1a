mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;
use project_desk::authz::ProjectRole;

#[tokio::test]
async fn notes_are_listed_pinned_first() -> Result<()> {
    let app = TestApp::spawn().await?;
    let admin = app.admin("root@example.com").await?;
    let owner = app.user("owner@example.com").await?;
    let viewer = app.user("viewer@example.com").await?;

    let project_id = app.project_owned_by(&admin, &owner, "Journal").await?;
    app.enroll(project_id, viewer.id, ProjectRole::Viewer).await?;
    let notes_uri = format!("/api/v1/notes/{}", project_id);

    let reply = app
        .post(
            &notes_uri,
            &owner.token,
            json!({
                "title": "Hosting",
                "content": "Managed database it is.",
                "category": "architecture",
                "tags": ["infra", " db ", "infra", ""],
                "is_pinned": true,
                "is_decision": true
            }),
        )
        .await?;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert_eq!(reply.data()["tags"], json!(["infra", "db"]));
    assert_eq!(reply.message(), "Note created successfully");

    app.post(&notes_uri, &owner.token, json!({ "title": "Standup", "content": "Nothing new." }))
        .await?;

    let reply = app.get(&notes_uri, &viewer.token).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["count"], 2);
    assert_eq!(reply.data()[0]["title"], "Hosting");
    assert_eq!(reply.data()[1]["tags"], json!([]));
    assert_eq!(reply.data()[1]["is_pinned"], false);

    let reply = app.get(&format!("{}?is_decision=true", notes_uri), &viewer.token).await?;
    assert_eq!(reply.body["count"], 1);

    let reply = app.get(&format!("{}?category=architecture", notes_uri), &viewer.token).await?;
    assert_eq!(reply.data()[0]["title"], "Hosting");

    let reply = app.get(&format!("{}?is_pinned=false", notes_uri), &viewer.token).await?;
    assert_eq!(reply.data()[0]["title"], "Standup");

    Ok(())
}

#[tokio::test]
async fn note_validation_and_updates() -> Result<()> {
    let app = TestApp::spawn().await?;
    let admin = app.admin("root@example.com").await?;
    let owner = app.user("owner@example.com").await?;
    let viewer = app.user("viewer@example.com").await?;

    let project_id = app.project_owned_by(&admin, &owner, "Journal").await?;
    app.enroll(project_id, viewer.id, ProjectRole::Viewer).await?;
    let notes_uri = format!("/api/v1/notes/{}", project_id);

    let reply = app.post(&notes_uri, &owner.token, json!({ "content": "no title" })).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.message(), "Note title is required");

    let reply = app.post(&notes_uri, &owner.token, json!({ "title": "no content" })).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.message(), "Note content is required");

    let reply = app.post(&notes_uri, &viewer.token, json!({ "title": "t", "content": "c" })).await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let note_id = app
        .post(&notes_uri, &owner.token, json!({ "title": "Retro", "content": "Went fine.", "category": "meeting" }))
        .await?
        .id()?;
    let note_uri = format!("{}/n/{}", notes_uri, note_id);

    let reply = app
        .put(&note_uri, &owner.token, json!({ "category": null, "tags": ["retro", "retro"] }))
        .await?;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert!(reply.data()["category"].is_null());
    assert_eq!(reply.data()["tags"], json!(["retro"]));
    assert_eq!(reply.data()["content"], "Went fine.");

    let reply = app.put(&note_uri, &owner.token, json!({})).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.message(), "No valid fields to update");

    let reply = app.get(&note_uri, &viewer.token).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data()["title"], "Retro");

    let reply = app.delete(&note_uri, &owner.token).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.message(), "Note deleted successfully");

    let reply = app.get(&note_uri, &viewer.token).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.message(), "Note not found");

    Ok(())
}
