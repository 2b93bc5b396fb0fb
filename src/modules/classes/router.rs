use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use super::controller::{
    archive_class, create_class, delete_class, get_class, join_class, list_classes, list_students,
    remove_student, update_class,
};
use crate::middleware::role::{require_student, require_teacher};
use crate::state::AppState;

pub fn init_classes_router(state: &AppState) -> Router<AppState> {
    let teacher = || middleware::from_fn_with_state(state.clone(), require_teacher);
    let student = || middleware::from_fn_with_state(state.clone(), require_student);

    Router::new()
        .route(
            "/",
            get(list_classes).merge(post(create_class).route_layer(teacher())),
        )
        .route("/join", post(join_class).route_layer(student()))
        .route(
            "/{class_id}",
            get(get_class).merge(
                put(update_class)
                    .delete(delete_class)
                    .route_layer(teacher()),
            ),
        )
        .route(
            "/{class_id}/archive",
            post(archive_class).route_layer(teacher()),
        )
        .route(
            "/{class_id}/students",
            get(list_students).route_layer(teacher()),
        )
        .route(
            "/{class_id}/students/{student_id}",
            delete(remove_student).route_layer(teacher()),
        )
}
