use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use tracing::instrument;

use classconnect_core::{AppError, ErrorResponse};
use classconnect_models::announcements::{
    Announcement, CreateAnnouncementRequest, UpdateAnnouncementRequest,
};
use classconnect_models::auth::MessageResponse;

use super::service::AnnouncementService;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Post an announcement
#[utoipa::path(
    post,
    path = "/api/classes/{class_id}/announcements",
    params(("class_id" = i64, Path, description = "Class ID")),
    request_body = CreateAnnouncementRequest,
    responses(
        (status = 201, description = "Announcement created", body = Announcement),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Not a teacher of this class", body = ErrorResponse)
    ),
    tag = "Announcements",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(teacher_id = auth_user.user_id()))]
pub async fn create_announcement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(class_id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<Announcement>), AppError> {
    let announcement = AnnouncementService::create_announcement(
        state.store(),
        class_id,
        auth_user.user_id(),
        dto,
        Utc::now(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(announcement)))
}

/// List a class's announcements, newest first
#[utoipa::path(
    get,
    path = "/api/classes/{class_id}/announcements",
    params(("class_id" = i64, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Announcements", body = Vec<Announcement>),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    tag = "Announcements",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id()))]
pub async fn list_announcements(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(class_id): Path<i64>,
) -> Result<Json<Vec<Announcement>>, AppError> {
    let announcements =
        AnnouncementService::list_announcements(state.store(), class_id, &auth_user.0, Utc::now())
            .await?;
    Ok(Json(announcements))
}

#[utoipa::path(
    get,
    path = "/api/classes/{class_id}/announcements/{announcement_id}",
    params(
        ("class_id" = i64, Path, description = "Class ID"),
        ("announcement_id" = i64, Path, description = "Announcement ID")
    ),
    responses(
        (status = 200, description = "Announcement", body = Announcement),
        (status = 403, description = "Not a member", body = ErrorResponse),
        (status = 404, description = "Announcement not found", body = ErrorResponse)
    ),
    tag = "Announcements",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id()))]
pub async fn get_announcement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((class_id, announcement_id)): Path<(i64, i64)>,
) -> Result<Json<Announcement>, AppError> {
    let announcement = AnnouncementService::get_announcement(
        state.store(),
        class_id,
        announcement_id,
        &auth_user.0,
        Utc::now(),
    )
    .await?;
    Ok(Json(announcement))
}

#[utoipa::path(
    put,
    path = "/api/classes/{class_id}/announcements/{announcement_id}",
    params(
        ("class_id" = i64, Path, description = "Class ID"),
        ("announcement_id" = i64, Path, description = "Announcement ID")
    ),
    request_body = UpdateAnnouncementRequest,
    responses(
        (status = 200, description = "Announcement updated", body = Announcement),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Announcement not found", body = ErrorResponse)
    ),
    tag = "Announcements",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(user_id = auth_user.user_id()))]
pub async fn update_announcement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((class_id, announcement_id)): Path<(i64, i64)>,
    ValidatedJson(dto): ValidatedJson<UpdateAnnouncementRequest>,
) -> Result<Json<Announcement>, AppError> {
    let announcement = AnnouncementService::update_announcement(
        state.store(),
        class_id,
        announcement_id,
        auth_user.user_id(),
        dto.into(),
    )
    .await?;
    Ok(Json(announcement))
}

#[utoipa::path(
    delete,
    path = "/api/classes/{class_id}/announcements/{announcement_id}",
    params(
        ("class_id" = i64, Path, description = "Class ID"),
        ("announcement_id" = i64, Path, description = "Announcement ID")
    ),
    responses(
        (status = 200, description = "Announcement deleted", body = MessageResponse),
        (status = 403, description = "Not the author", body = ErrorResponse),
        (status = 404, description = "Announcement not found", body = ErrorResponse)
    ),
    tag = "Announcements",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id()))]
pub async fn delete_announcement(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((class_id, announcement_id)): Path<(i64, i64)>,
) -> Result<Json<MessageResponse>, AppError> {
    AnnouncementService::delete_announcement(
        state.store(),
        class_id,
        announcement_id,
        auth_user.user_id(),
    )
    .await?;
    Ok(Json(MessageResponse::new("Announcement deleted successfully")))
}
