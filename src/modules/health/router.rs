use axum::{Router, routing::get};

use super::controller::{health, ping};
use crate::state::AppState;

/// Mounted at the root, outside `/api` and its rate limits.
pub fn init_health_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/health", get(health))
}
