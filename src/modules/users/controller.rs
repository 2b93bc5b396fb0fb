use anyhow::anyhow;
use axum::Json;
use axum::extract::State;
use tracing::instrument;

use classconnect_core::{AppError, ErrorResponse};
use classconnect_models::users::CurrentUserResponse;

use super::service::UserService;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Get the authenticated user's profile
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Current user", body = CurrentUserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Account no longer exists", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id()))]
pub async fn get_me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<CurrentUserResponse>, AppError> {
    let user = UserService::current_user(state.store(), auth_user.user_id())
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;
    Ok(Json(user))
}
