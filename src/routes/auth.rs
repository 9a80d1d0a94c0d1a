use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::user::{
    ChangePasswordRequest, CurrentUser, EmailRequest, IssuedToken, LoginRequest, RefreshRequest, RegisterRequest,
    RegisteredUser, ResendVerificationRequest, ResetPasswordRequest, Session, User,
};
use crate::payload::Payload;
use crate::response::ApiResponse;

/// Delivery is out of scope; the token an e-mail would carry goes to the debug log.
fn log_issued(kind: &str, issued: &IssuedToken) {
    tracing::debug!(user_id = %issued.user_id, token = %issued.token, "{kind} token issued");
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    security(()),
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisteredUser),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Payload(payload): Payload<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RegisteredUser>>)> {
    let (registered, issued) = state
        .identity()
        .register(&payload.email, &payload.password, payload.metadata)
        .await?;

    log_issued("email verification", &issued);
    tracing::info!(user_id = %registered.user.id, "user registered");

    Ok(ApiResponse::created(
        registered,
        "User registered successfully. Please check your email to verify your account.",
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    security(()),
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = Session),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Payload(payload): Payload<LoginRequest>,
) -> AppResult<Json<ApiResponse<Session>>> {
    let session = state.identity().login(&payload.email, &payload.password).await?;
    Ok(ApiResponse::ok_with_message(session, "Login successful"))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh-token",
    tag = "Auth",
    security(()),
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed", body = Session),
        (status = 401, description = "Invalid or expired refresh token")
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    Payload(payload): Payload<RefreshRequest>,
) -> AppResult<Json<ApiResponse<Session>>> {
    let session = state.identity().refresh(&payload.refresh_token).await?;
    Ok(ApiResponse::ok_with_message(session, "Token refreshed successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/verify-email/{token}",
    tag = "Auth",
    security(()),
    params(("token" = String, Path, description = "Verification token")),
    responses(
        (status = 200, description = "Email verified", body = User),
        (status = 400, description = "Invalid or expired token")
    )
)]
pub async fn verify_email(State(state): State<AppState>, Path(token): Path<String>) -> AppResult<Json<ApiResponse<User>>> {
    let user = state.identity().verify_email(&token).await?;
    Ok(ApiResponse::ok_with_message(user, "Email verified successfully"))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    tag = "Auth",
    security(()),
    request_body = EmailRequest,
    responses((status = 200, description = "Reset requested"))
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Payload(payload): Payload<EmailRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    if let Some(issued) = state.identity().forgot_password(&payload.email).await? {
        log_issued("password reset", &issued);
    }

    Ok(ApiResponse::message(
        "If an account exists with this email, a password reset link has been sent.",
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password/{token}",
    tag = "Auth",
    security(()),
    params(("token" = String, Path, description = "Password reset token")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = User),
        (status = 400, description = "Invalid or expired token")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Payload(payload): Payload<ResetPasswordRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = state.identity().reset_password(&token, &payload.new_password).await?;
    Ok(ApiResponse::ok_with_message(user, "Password reset successfully"))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<ApiResponse<()>>> {
    state.identity().logout(&auth).await?;
    Ok(ApiResponse::message("Logout successful"))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/current-user",
    tag = "Auth",
    responses(
        (status = 200, description = "Authenticated user", body = CurrentUser),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn current_user(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<ApiResponse<CurrentUser>>> {
    let current = state.identity().current_user(&auth).await?;
    Ok(ApiResponse::ok(current))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/change-password",
    tag = "Auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 401, description = "Old password incorrect")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Payload(payload): Payload<ChangePasswordRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    state
        .identity()
        .change_password(&auth, &payload.old_password, &payload.new_password)
        .await?;

    Ok(ApiResponse::message("Password changed successfully"))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/resend-email-verification",
    tag = "Auth",
    request_body(content = ResendVerificationRequest, description = "Defaults to the caller's e-mail"),
    responses(
        (status = 200, description = "Verification re-sent"),
        (status = 400, description = "Already verified")
    )
)]
pub async fn resend_email_verification(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Option<Payload<ResendVerificationRequest>>,
) -> AppResult<Json<ApiResponse<()>>> {
    let email = payload
        .and_then(|Payload(body)| body.email)
        .filter(|email| !email.trim().is_empty())
        .unwrap_or_else(|| auth.email.clone());

    if let Some(issued) = state.identity().resend_verification(&email).await? {
        log_issued("email verification", &issued);
    }

    Ok(ApiResponse::message("Verification email sent successfully"))
}
