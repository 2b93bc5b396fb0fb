use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use tracing::instrument;

use classconnect_core::{AppError, ErrorResponse};
use classconnect_models::assignments::{
    Assignment, AssignmentResponse, CreateAssignmentRequest, UpdateAssignmentRequest,
};
use classconnect_models::auth::MessageResponse;

use super::service::AssignmentService;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Create an assignment
#[utoipa::path(
    post,
    path = "/api/classes/{class_id}/assignments",
    params(("class_id" = i64, Path, description = "Class ID")),
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Assignment created", body = Assignment),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Not a teacher of this class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(teacher_id = auth_user.user_id()))]
pub async fn create_assignment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(class_id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<CreateAssignmentRequest>,
) -> Result<(StatusCode, Json<Assignment>), AppError> {
    let assignment = AssignmentService::create_assignment(
        state.store(),
        class_id,
        auth_user.user_id(),
        dto,
        Utc::now(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// List a class's assignments
#[utoipa::path(
    get,
    path = "/api/classes/{class_id}/assignments",
    params(("class_id" = i64, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Assignments; students also get status and grade", body = Vec<AssignmentResponse>),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id()))]
pub async fn list_assignments(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(class_id): Path<i64>,
) -> Result<Json<Vec<AssignmentResponse>>, AppError> {
    let assignments =
        AssignmentService::list_assignments(state.store(), class_id, &auth_user.0).await?;
    Ok(Json(assignments))
}

/// Get an assignment
#[utoipa::path(
    get,
    path = "/api/classes/{class_id}/assignments/{assignment_id}",
    params(
        ("class_id" = i64, Path, description = "Class ID"),
        ("assignment_id" = i64, Path, description = "Assignment ID")
    ),
    responses(
        (status = 200, description = "Assignment", body = AssignmentResponse),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id()))]
pub async fn get_assignment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((class_id, assignment_id)): Path<(i64, i64)>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let assignment =
        AssignmentService::get_assignment(state.store(), class_id, assignment_id, &auth_user.0)
            .await?;
    Ok(Json(assignment))
}

/// Update an assignment
#[utoipa::path(
    put,
    path = "/api/classes/{class_id}/assignments/{assignment_id}",
    params(
        ("class_id" = i64, Path, description = "Class ID"),
        ("assignment_id" = i64, Path, description = "Assignment ID")
    ),
    request_body = UpdateAssignmentRequest,
    responses(
        (status = 200, description = "Assignment updated", body = Assignment),
        (status = 400, description = "Points possible below an existing grade", body = ErrorResponse),
        (status = 403, description = "Not a teacher of this class", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(teacher_id = auth_user.user_id()))]
pub async fn update_assignment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((class_id, assignment_id)): Path<(i64, i64)>,
    ValidatedJson(dto): ValidatedJson<UpdateAssignmentRequest>,
) -> Result<Json<Assignment>, AppError> {
    let assignment = AssignmentService::update_assignment(
        state.store(),
        class_id,
        assignment_id,
        auth_user.user_id(),
        dto.into(),
    )
    .await?;
    Ok(Json(assignment))
}

/// Delete an assignment and its submissions
#[utoipa::path(
    delete,
    path = "/api/classes/{class_id}/assignments/{assignment_id}",
    params(
        ("class_id" = i64, Path, description = "Class ID"),
        ("assignment_id" = i64, Path, description = "Assignment ID")
    ),
    responses(
        (status = 200, description = "Assignment deleted", body = MessageResponse),
        (status = 403, description = "Not a teacher of this class", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    ),
    tag = "Assignments",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(teacher_id = auth_user.user_id()))]
pub async fn delete_assignment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((class_id, assignment_id)): Path<(i64, i64)>,
) -> Result<Json<MessageResponse>, AppError> {
    AssignmentService::delete_assignment(
        state.store(),
        class_id,
        assignment_id,
        auth_user.user_id(),
    )
    .await?;
    Ok(Json(MessageResponse::new("Assignment deleted successfully")))
}
