use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::controller::{
    grade_submission, list_submissions, my_submission, student_submission, submit,
};
use crate::middleware::role::{require_student, require_teacher};
use crate::state::AppState;

/// Mounted under `/api/classes`.
pub fn init_submissions_router(state: &AppState) -> Router<AppState> {
    let teacher = || middleware::from_fn_with_state(state.clone(), require_teacher);
    let student = || middleware::from_fn_with_state(state.clone(), require_student);

    Router::new()
        .route(
            "/{class_id}/assignments/{assignment_id}/submit",
            post(submit).route_layer(student()),
        )
        .route(
            "/{class_id}/assignments/{assignment_id}/submission",
            get(my_submission).route_layer(student()),
        )
        .route(
            "/{class_id}/assignments/{assignment_id}/submissions",
            get(list_submissions).route_layer(teacher()),
        )
        .route(
            "/{class_id}/assignments/{assignment_id}/submissions/{student_id}",
            get(student_submission),
        )
        .route(
            "/{class_id}/assignments/{assignment_id}/submissions/{student_id}/grade",
            put(grade_submission)
                .post(grade_submission)
                .route_layer(teacher()),
        )
}
