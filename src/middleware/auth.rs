use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use classconnect_auth::{AuthContext, authenticate};
use classconnect_core::AppError;

use crate::state::AppState;

/// Verifies the bearer token and attaches the caller's [`AuthContext`] to the
/// request. The handler never runs on failure.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = authenticate(req.headers(), Utc::now(), &state.jwt_config)?;
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

/// The authenticated caller.
///
/// Reads the context left by [`require_auth`]; on routes without that layer it
/// verifies the header itself.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthContext);

impl AuthUser {
    pub fn user_id(&self) -> i64 {
        self.0.user_id
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<AuthContext>() {
            return Ok(AuthUser(ctx.clone()));
        }

        let ctx = authenticate(&parts.headers, Utc::now(), &state.jwt_config)?;
        parts.extensions.insert(ctx.clone());
        Ok(AuthUser(ctx))
    }
}
