use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use tracing::instrument;

use classconnect_core::{AppError, ErrorResponse};
use classconnect_models::submissions::{GradeRequest, SubmissionView, SubmitRequest};

use super::service::SubmissionService;
use crate::metrics::{track_grade_recorded, track_submission};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Submit (or resubmit) work for an assignment
#[utoipa::path(
    post,
    path = "/api/classes/{class_id}/assignments/{assignment_id}/submit",
    params(
        ("class_id" = i64, Path, description = "Class ID"),
        ("assignment_id" = i64, Path, description = "Assignment ID")
    ),
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Submission saved", body = SubmissionView),
        (status = 400, description = "Empty or late submission", body = ErrorResponse),
        (status = 403, description = "Not enrolled", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 409, description = "Already graded", body = ErrorResponse)
    ),
    tag = "Submissions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(student_id = auth_user.user_id()))]
pub async fn submit(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((class_id, assignment_id)): Path<(i64, i64)>,
    ValidatedJson(dto): ValidatedJson<SubmitRequest>,
) -> Result<Json<SubmissionView>, AppError> {
    let view = SubmissionService::submit(
        state.store(),
        class_id,
        assignment_id,
        auth_user.user_id(),
        dto,
        Utc::now(),
    )
    .await?;

    if let SubmissionView::Submitted(record) = &view {
        track_submission(record.is_late);
    }
    Ok(Json(view))
}

/// The caller's own submission
#[utoipa::path(
    get,
    path = "/api/classes/{class_id}/assignments/{assignment_id}/submission",
    params(
        ("class_id" = i64, Path, description = "Class ID"),
        ("assignment_id" = i64, Path, description = "Assignment ID")
    ),
    responses(
        (status = 200, description = "Submission, or not_submitted", body = SubmissionView),
        (status = 403, description = "Not enrolled", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    ),
    tag = "Submissions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(student_id = auth_user.user_id()))]
pub async fn my_submission(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((class_id, assignment_id)): Path<(i64, i64)>,
) -> Result<Json<SubmissionView>, AppError> {
    let view = SubmissionService::my_submission(
        state.store(),
        class_id,
        assignment_id,
        auth_user.user_id(),
    )
    .await?;
    Ok(Json(view))
}

/// Every enrolled student's submission state
#[utoipa::path(
    get,
    path = "/api/classes/{class_id}/assignments/{assignment_id}/submissions",
    params(
        ("class_id" = i64, Path, description = "Class ID"),
        ("assignment_id" = i64, Path, description = "Assignment ID")
    ),
    responses(
        (status = 200, description = "One entry per student", body = Vec<SubmissionView>),
        (status = 403, description = "Not a teacher of this class", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    ),
    tag = "Submissions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(teacher_id = auth_user.user_id()))]
pub async fn list_submissions(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((class_id, assignment_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<SubmissionView>>, AppError> {
    let roster =
        SubmissionService::roster(state.store(), class_id, assignment_id, auth_user.user_id())
            .await?;
    Ok(Json(roster))
}

/// One student's submission
#[utoipa::path(
    get,
    path = "/api/classes/{class_id}/assignments/{assignment_id}/submissions/{student_id}",
    params(
        ("class_id" = i64, Path, description = "Class ID"),
        ("assignment_id" = i64, Path, description = "Assignment ID"),
        ("student_id" = i64, Path, description = "Student user ID")
    ),
    responses(
        (status = 200, description = "Submission, or not_submitted", body = SubmissionView),
        (status = 403, description = "Not allowed", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    ),
    tag = "Submissions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id()))]
pub async fn student_submission(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((class_id, assignment_id, student_id)): Path<(i64, i64, i64)>,
) -> Result<Json<SubmissionView>, AppError> {
    let view = SubmissionService::student_submission(
        state.store(),
        class_id,
        assignment_id,
        student_id,
        &auth_user.0,
    )
    .await?;
    Ok(Json(view))
}

/// Grade a student's submission
#[utoipa::path(
    put,
    path = "/api/classes/{class_id}/assignments/{assignment_id}/submissions/{student_id}/grade",
    params(
        ("class_id" = i64, Path, description = "Class ID"),
        ("assignment_id" = i64, Path, description = "Assignment ID"),
        ("student_id" = i64, Path, description = "Student user ID")
    ),
    request_body = GradeRequest,
    responses(
        (status = 200, description = "Submission graded", body = SubmissionView),
        (status = 400, description = "Grade out of range", body = ErrorResponse),
        (status = 403, description = "Not a teacher of this class", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse)
    ),
    tag = "Submissions",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(teacher_id = auth_user.user_id()))]
pub async fn grade_submission(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((class_id, assignment_id, student_id)): Path<(i64, i64, i64)>,
    ValidatedJson(dto): ValidatedJson<GradeRequest>,
) -> Result<Json<SubmissionView>, AppError> {
    let view = SubmissionService::grade(
        state.store(),
        class_id,
        assignment_id,
        student_id,
        auth_user.user_id(),
        dto,
        Utc::now(),
    )
    .await?;
    track_grade_recorded();
    Ok(Json(view))
}
