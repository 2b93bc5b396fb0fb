//! Role allow-lists for routes.
//!
//! ```rust,ignore
//! use axum::{middleware, routing::post};
//! use crate::middleware::role::require_teacher;
//!
//! let route = post(create_assignment)
//!     .route_layer(middleware::from_fn_with_state(state.clone(), require_teacher));
//! ```

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use classconnect_auth::check_role;
use classconnect_core::AppError;
use classconnect_models::UserRole;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Passes the request on only when the caller's role is in `allowed_roles`.
pub async fn require_roles(
    state: &AppState,
    req: Request,
    next: Next,
    allowed_roles: &[UserRole],
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let AuthUser(ctx) = AuthUser::from_request_parts(&mut parts, state).await?;
    check_role(&ctx, allowed_roles)?;

    Ok(next.run(Request::from_parts(parts, body)).await)
}

pub async fn require_teacher(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(&state, req, next, &[UserRole::Teacher]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

pub async fn require_student(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(&state, req, next, &[UserRole::Student]).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}
