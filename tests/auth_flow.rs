mod common;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use serde_json::json;

use common::{TestApp, PASSWORD};
use project_desk::config::AppConfig;

#[tokio::test]
async fn register_login_and_current_user() -> Result<()> {
    let app = TestApp::spawn().await?;

    let reply = app
        .request(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({
                "email": "  Ada@Example.com ",
                "password": PASSWORD,
                "metadata": { "full_name": "Ada Lovelace" }
            })),
        )
        .await?;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert_eq!(reply.data()["user"]["email"], "ada@example.com");
    assert_eq!(reply.data()["user"]["email_verified"], false);
    assert_eq!(reply.data()["profile"]["role"], "member");
    assert_eq!(reply.data()["profile"]["full_name"], "Ada Lovelace");

    let ada = app.login("ada@example.com", PASSWORD).await?;

    let me = app.get("/api/v1/auth/current-user", &ada.token).await?;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.data()["user"]["id"], ada.id.to_string());
    assert_eq!(me.data()["profile"]["full_name"], "Ada Lovelace");

    Ok(())
}

#[tokio::test]
async fn registration_rejects_duplicates_and_weak_passwords() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.user("dup@example.com").await?;

    let reply = app
        .request(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": "DUP@example.com", "password": PASSWORD })),
        )
        .await?;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.message(), "Email is already registered");

    let reply = app
        .request(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(json!({ "email": "short@example.com", "password": "12345" })),
        )
        .await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.message(), "Password must be at least 6 characters long");

    let reply = app
        .request("POST", "/api/v1/auth/register", None, Some(json!({ "email": "nobody" })))
        .await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "Validation error");

    Ok(())
}

#[tokio::test]
async fn wrong_password_is_rejected() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.user("grace@example.com").await?;

    let reply = app
        .request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "grace@example.com", "password": "not-the-password" })),
        )
        .await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.message(), "Invalid credentials");

    Ok(())
}

#[tokio::test]
async fn refresh_token_is_single_use() -> Result<()> {
    let app = TestApp::spawn().await?;
    let user = app.user("linus@example.com").await?;

    let body = json!({ "refresh_token": user.refresh_token });
    let first = app.request("POST", "/api/v1/auth/refresh-token", None, Some(body.clone())).await?;
    assert_eq!(first.status, StatusCode::OK, "{}", first.body);
    let new_access = first.data()["access_token"].as_str().context("missing access token")?;
    assert_ne!(first.data()["refresh_token"], body["refresh_token"]);

    let replay = app.request("POST", "/api/v1/auth/refresh-token", None, Some(body)).await?;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert_eq!(replay.message(), "Invalid or expired refresh token");

    // the rotated session's access token is revoked along with its refresh token
    let old = app.get("/api/v1/auth/current-user", &user.token).await?;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);

    let fresh = app.get("/api/v1/auth/current-user", new_access).await?;
    assert_eq!(fresh.status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn logout_revokes_the_session() -> Result<()> {
    let app = TestApp::spawn().await?;
    let user = app.user("ken@example.com").await?;

    let reply = app.request("POST", "/api/v1/auth/logout", Some(&user.token), None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.message(), "Logout successful");

    let reply = app.get("/api/v1/auth/current-user", &user.token).await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.message(), "Session has been revoked or does not exist");

    Ok(())
}

#[tokio::test]
async fn password_reset_signs_out_everywhere() -> Result<()> {
    let app = TestApp::spawn().await?;
    let user = app.user("barbara@example.com").await?;

    // unknown addresses are answered the same way
    let reply = app
        .request("POST", "/api/v1/auth/forgot-password", None, Some(json!({ "email": "ghost@example.com" })))
        .await?;
    assert_eq!(reply.status, StatusCode::OK);

    let issued = app
        .identity()
        .forgot_password("barbara@example.com")
        .await?
        .context("expected a reset token")?;

    let uri = format!("/api/v1/auth/reset-password/{}", issued.token);
    let reply = app.request("POST", &uri, None, Some(json!({ "newPassword": "brand-new-pass" }))).await?;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);

    let again = app.request("POST", &uri, None, Some(json!({ "new_password": "another-pass" }))).await?;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.message(), "Invalid or expired reset token");

    let old = app.get("/api/v1/auth/current-user", &user.token).await?;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);

    assert!(app.login("barbara@example.com", PASSWORD).await.is_err());
    app.login("barbara@example.com", "brand-new-pass").await?;

    Ok(())
}

#[tokio::test]
async fn change_password_keeps_only_the_calling_session() -> Result<()> {
    let app = TestApp::spawn().await?;
    let laptop = app.user("edsger@example.com").await?;
    let phone = app.login("edsger@example.com", PASSWORD).await?;

    let reply = app
        .post(
            "/api/v1/auth/change-password",
            &laptop.token,
            json!({ "oldPassword": "wrong-one", "newPassword": "goto-considered" }),
        )
        .await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.message(), "The old password you provided is incorrect");

    let reply = app
        .post(
            "/api/v1/auth/change-password",
            &laptop.token,
            json!({ "old_password": PASSWORD, "new_password": "goto-considered" }),
        )
        .await?;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);

    assert_eq!(app.get("/api/v1/auth/current-user", &laptop.token).await?.status, StatusCode::OK);
    assert_eq!(app.get("/api/v1/auth/current-user", &phone.token).await?.status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn email_verification_gates_login_when_required() -> Result<()> {
    let config = AppConfig {
        require_email_verification: true,
        ..AppConfig::default()
    };
    let app = TestApp::with_config(config).await?;

    let (registered, issued) = app.identity().register("alan@example.com", PASSWORD, None).await?;
    assert!(!registered.user.email_verified);

    let reply = app
        .request(
            "POST",
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": "alan@example.com", "password": PASSWORD })),
        )
        .await?;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.message(), "Email not confirmed");

    let uri = format!("/api/v1/auth/verify-email/{}", issued.token);
    let reply = app.request("GET", &uri, None, None).await?;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    assert_eq!(reply.data()["email_verified"], true);

    let reply = app.request("GET", &uri, None, None).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let user = app.login("alan@example.com", PASSWORD).await?;

    // the body is optional and defaults to the caller's address
    let reply = app
        .request("POST", "/api/v1/auth/resend-email-verification", Some(&user.token), None)
        .await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.message(), "Email is already verified");

    Ok(())
}
