use std::any::Any;

use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, middleware};
use classconnect_config::RateLimitRule;
use classconnect_core::ErrorResponse;
use classconnect_core::errors::INTERNAL_ERROR_MESSAGE;
use tower_governor::GovernorLayer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as _};
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::logging::{REQUEST_ID_HEADER, logging_middleware};
use crate::metrics::metrics_middleware;
use crate::middleware::auth::require_auth;
use crate::modules::announcements::router::init_announcements_router;
use crate::modules::assignments::router::init_assignments_router;
use crate::modules::auth::router::init_auth_router;
use crate::modules::chat::router::init_chat_router;
use crate::modules::classes::router::init_classes_router;
use crate::modules::health::router::init_health_router;
use crate::modules::submissions::router::init_submissions_router;
use crate::modules::users::router::init_users_router;
use crate::state::AppState;

pub fn init_router(state: AppState) -> Router {
    let rate_limit = state.rate_limit_config;
    let authenticated = || middleware::from_fn_with_state(state.clone(), require_auth);

    let classes = init_classes_router(&state)
        .merge(init_assignments_router(&state))
        .merge(init_submissions_router(&state))
        .merge(init_announcements_router(&state))
        .merge(init_chat_router());

    let protected = Router::new()
        .nest("/users", init_users_router().route_layer(authenticated()))
        .nest("/classes", classes.route_layer(authenticated()));

    let api = Router::new()
        .nest(
            "/auth",
            with_optional_rate_limit(init_auth_router(), rate_limit.enabled, rate_limit.auth),
        )
        .merge(with_optional_rate_limit(
            protected,
            rate_limit.enabled,
            rate_limit.general,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Scalar::with_url("/scalar", ApiDoc::openapi()))
        .merge(init_health_router())
        .nest("/api", api)
        .with_state(state.clone())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors_layer(&state))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}

fn with_optional_rate_limit(
    router: Router<AppState>,
    enabled: bool,
    rule: RateLimitRule,
) -> Router<AppState> {
    if !enabled {
        return router;
    }

    match rule.governor_config() {
        Some(config) => router.layer(GovernorLayer::new(config)),
        None => {
            warn!(?rule, "Invalid rate limit rule, serving without a limit");
            router
        }
    }
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([REQUEST_ID_HEADER])
        .allow_credentials(true)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: INTERNAL_ERROR_MESSAGE.to_string(),
        }),
    )
        .into_response()
}
