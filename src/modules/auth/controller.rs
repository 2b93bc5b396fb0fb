use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use tracing::{instrument, warn};

use classconnect_core::{AppError, ErrorResponse};
use classconnect_models::auth::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, RefreshTokenRequest,
    RegisterRequest, ResetPasswordRequest, VerifyEmailRequest,
};

use super::error::AuthError;
use super::service::AuthService;
use crate::metrics::{
    track_login_failure, track_login_success, track_password_reset, track_user_registered,
};
use crate::state::AppState;
use crate::utils::email::EmailService;
use crate::validator::ValidatedJson;

pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists with that email, a password reset link has been sent.";

/// Register a new teacher or student
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let now = Utc::now();
    let (user, response) =
        AuthService::register(state.store(), &state.hasher, &state.jwt_config, dto, now).await?;
    track_user_registered(user.role);

    match AuthService::issue_verification_token(state.store(), user.id, now).await {
        Ok(token) => {
            let mailer = EmailService::new(state.email_config.clone());
            if let Err(e) = mailer
                .send_verification_email(&user.email, &user.full_name(), &token.token)
                .await
            {
                warn!(user_id = user.id, error = %e, "Failed to send verification email");
            }
        }
        Err(e) => warn!(user_id = user.id, error = %e, "Failed to issue verification token"),
    }

    Ok((StatusCode::CREATED, Json(response)))
}

/// Login and receive an access token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 403, description = "Account registered under another role", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    match AuthService::login(
        state.store(),
        &state.hasher,
        &state.jwt_config,
        dto,
        Utc::now(),
    )
    .await
    {
        Ok(response) => {
            track_login_success(response.user.role);
            Ok(Json(response))
        }
        Err(err) => {
            track_login_failure(err.reason());
            Err(err.into())
        }
    }
}

/// Exchange a valid token for a fresh one
#[utoipa::path(
    post,
    path = "/api/auth/refresh-token",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Token refreshed", body = AuthResponse),
        (status = 401, description = "Invalid or expired token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<RefreshTokenRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let response =
        AuthService::refresh(state.store(), &state.jwt_config, &dto.token, Utc::now()).await?;
    Ok(Json(response))
}

/// Request a password reset email
#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email sent if the account exists", body = MessageResponse),
        (status = 400, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip(state, dto))]
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    match AuthService::request_password_reset(state.store(), &dto.email, Utc::now()).await {
        Ok((user, token)) => {
            track_password_reset("requested");
            let mailer = EmailService::new(state.email_config.clone());
            if let Err(e) = mailer
                .send_password_reset_email(&user.email, &user.full_name(), &token.token)
                .await
            {
                warn!(user_id = user.id, error = %e, "Failed to send password reset email");
            }
        }
        Err(AuthError::EmailNotFound) => {}
        Err(e) => warn!(error = %e, "Password reset request failed"),
    }

    Ok(Json(MessageResponse::new(FORGOT_PASSWORD_MESSAGE)))
}

/// Set a new password with a reset token
#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::reset_password(
        state.store(),
        &state.hasher,
        &dto.token,
        &dto.new_password,
        Utc::now(),
    )
    .await?;
    track_password_reset("completed");

    Ok(Json(MessageResponse::new(
        "Password has been reset successfully. You can now log in with your new password.",
    )))
}

/// Confirm an email address
#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
#[instrument(skip_all)]
pub async fn verify_email(
    State(state): State<AppState>,
    ValidatedJson(dto): ValidatedJson<VerifyEmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    AuthService::verify_email(state.store(), &dto.token, Utc::now()).await?;
    Ok(Json(MessageResponse::new("Email verified successfully")))
}
