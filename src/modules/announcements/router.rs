use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::controller::{
    create_announcement, delete_announcement, get_announcement, list_announcements,
    update_announcement,
};
use crate::middleware::role::require_teacher;
use crate::state::AppState;

/// Mounted under `/api/classes`.
pub fn init_announcements_router(state: &AppState) -> Router<AppState> {
    let teacher = || middleware::from_fn_with_state(state.clone(), require_teacher);

    Router::new()
        .route(
            "/{class_id}/announcements",
            get(list_announcements).merge(post(create_announcement).route_layer(teacher())),
        )
        .route(
            "/{class_id}/announcements/{announcement_id}",
            get(get_announcement).merge(
                put(update_announcement)
                    .delete(delete_announcement)
                    .route_layer(teacher()),
            ),
        )
}
