use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::controller::{
    create_assignment, delete_assignment, get_assignment, list_assignments, update_assignment,
};
use crate::middleware::role::require_teacher;
use crate::state::AppState;

/// Mounted under `/api/classes`.
pub fn init_assignments_router(state: &AppState) -> Router<AppState> {
    let teacher = || middleware::from_fn_with_state(state.clone(), require_teacher);

    Router::new()
        .route(
            "/{class_id}/assignments",
            get(list_assignments).merge(post(create_assignment).route_layer(teacher())),
        )
        .route(
            "/{class_id}/assignments/{assignment_id}",
            get(get_assignment).merge(
                put(update_assignment)
                    .delete(delete_assignment)
                    .route_layer(teacher()),
            ),
        )
}
