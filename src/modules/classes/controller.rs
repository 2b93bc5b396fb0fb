use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use tracing::instrument;

use classconnect_core::{AppError, ErrorResponse};
use classconnect_models::auth::MessageResponse;
use classconnect_models::classes::{
    Class, ClassStudent, CreateClassRequest, JoinClassRequest, UpdateClassRequest,
};

use super::service::ClassService;
use crate::metrics::track_class_created;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Create a class
#[utoipa::path(
    post,
    path = "/api/classes",
    request_body = CreateClassRequest,
    responses(
        (status = 201, description = "Class created", body = Class),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Teachers only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(teacher_id = auth_user.user_id()))]
pub async fn create_class(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<CreateClassRequest>,
) -> Result<(StatusCode, Json<Class>), AppError> {
    let class =
        ClassService::create_class(state.store(), auth_user.user_id(), dto, Utc::now()).await?;
    track_class_created();
    Ok((StatusCode::CREATED, Json(class)))
}

/// List the caller's classes
#[utoipa::path(
    get,
    path = "/api/classes",
    responses(
        (status = 200, description = "Taught or enrolled classes", body = Vec<Class>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id()))]
pub async fn list_classes(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Class>>, AppError> {
    let classes = ClassService::list_classes(state.store(), &auth_user.0).await?;
    Ok(Json(classes))
}

/// Get a class
#[utoipa::path(
    get,
    path = "/api/classes/{class_id}",
    params(("class_id" = i64, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class", body = Class),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id()))]
pub async fn get_class(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(class_id): Path<i64>,
) -> Result<Json<Class>, AppError> {
    let class = ClassService::get_class(state.store(), class_id, &auth_user.0).await?;
    Ok(Json(class))
}

/// Update a class
#[utoipa::path(
    put,
    path = "/api/classes/{class_id}",
    params(("class_id" = i64, Path, description = "Class ID")),
    request_body = UpdateClassRequest,
    responses(
        (status = 200, description = "Class updated", body = Class),
        (status = 403, description = "Not a teacher of this class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(teacher_id = auth_user.user_id()))]
pub async fn update_class(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(class_id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<UpdateClassRequest>,
) -> Result<Json<Class>, AppError> {
    let class =
        ClassService::update_class(state.store(), class_id, auth_user.user_id(), dto.into())
            .await?;
    Ok(Json(class))
}

/// Archive a class
#[utoipa::path(
    post,
    path = "/api/classes/{class_id}/archive",
    params(("class_id" = i64, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class archived", body = Class),
        (status = 403, description = "Not a teacher of this class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(teacher_id = auth_user.user_id()))]
pub async fn archive_class(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(class_id): Path<i64>,
) -> Result<Json<Class>, AppError> {
    let class = ClassService::archive_class(state.store(), class_id, auth_user.user_id()).await?;
    Ok(Json(class))
}

/// Delete a class
#[utoipa::path(
    delete,
    path = "/api/classes/{class_id}",
    params(("class_id" = i64, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Class deleted", body = MessageResponse),
        (status = 403, description = "Only the owning teacher can delete", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(teacher_id = auth_user.user_id()))]
pub async fn delete_class(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(class_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    ClassService::delete_class(state.store(), class_id, auth_user.user_id()).await?;
    Ok(Json(MessageResponse::new("Class deleted successfully")))
}

/// Join a class with its code
#[utoipa::path(
    post,
    path = "/api/classes/join",
    request_body = JoinClassRequest,
    responses(
        (status = 200, description = "Joined class", body = Class),
        (status = 403, description = "Students only", body = ErrorResponse),
        (status = 404, description = "Invalid class code", body = ErrorResponse),
        (status = 409, description = "Already enrolled", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(student_id = auth_user.user_id()))]
pub async fn join_class(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<JoinClassRequest>,
) -> Result<Json<Class>, AppError> {
    let class = ClassService::join_class(
        state.store(),
        auth_user.user_id(),
        &dto.class_code,
        Utc::now(),
    )
    .await?;
    Ok(Json(class))
}

/// List enrolled students
#[utoipa::path(
    get,
    path = "/api/classes/{class_id}/students",
    params(("class_id" = i64, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Roster", body = Vec<ClassStudent>),
        (status = 403, description = "Not a teacher of this class", body = ErrorResponse),
        (status = 404, description = "Class not found", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(teacher_id = auth_user.user_id()))]
pub async fn list_students(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(class_id): Path<i64>,
) -> Result<Json<Vec<ClassStudent>>, AppError> {
    let students =
        ClassService::list_students(state.store(), class_id, auth_user.user_id()).await?;
    Ok(Json(students))
}

/// Remove a student from a class
#[utoipa::path(
    delete,
    path = "/api/classes/{class_id}/students/{student_id}",
    params(
        ("class_id" = i64, Path, description = "Class ID"),
        ("student_id" = i64, Path, description = "Student user ID")
    ),
    responses(
        (status = 200, description = "Student removed", body = MessageResponse),
        (status = 403, description = "Not a teacher of this class", body = ErrorResponse),
        (status = 404, description = "Student not enrolled", body = ErrorResponse)
    ),
    tag = "Classes",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(teacher_id = auth_user.user_id()))]
pub async fn remove_student(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((class_id, student_id)): Path<(i64, i64)>,
) -> Result<Json<MessageResponse>, AppError> {
    ClassService::remove_student(state.store(), class_id, auth_user.user_id(), student_id)
        .await?;
    Ok(Json(MessageResponse::new("Student removed from class")))
}
