use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use tracing::instrument;

use classconnect_core::{AppError, ErrorResponse};
use classconnect_models::auth::MessageResponse;
use classconnect_models::chat::{ChatMessage, SendMessageRequest};

use super::service::ChatService;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Class chat history, oldest first
#[utoipa::path(
    get,
    path = "/api/classes/{class_id}/chat",
    params(("class_id" = i64, Path, description = "Class ID")),
    responses(
        (status = 200, description = "Messages", body = Vec<ChatMessage>),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    tag = "Chat",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id()))]
pub async fn list_messages(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(class_id): Path<i64>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    let messages = ChatService::list_messages(state.store(), class_id, &auth_user.0).await?;
    Ok(Json(messages))
}

#[utoipa::path(
    post,
    path = "/api/classes/{class_id}/chat",
    params(("class_id" = i64, Path, description = "Class ID")),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message posted", body = ChatMessage),
        (status = 400, description = "Empty or too long", body = ErrorResponse),
        (status = 403, description = "Not a member", body = ErrorResponse)
    ),
    tag = "Chat",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto), fields(user_id = auth_user.user_id()))]
pub async fn send_message(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(class_id): Path<i64>,
    ValidatedJson(dto): ValidatedJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessage>), AppError> {
    let message =
        ChatService::send_message(state.store(), class_id, &auth_user.0, &dto.content, Utc::now())
            .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[utoipa::path(
    delete,
    path = "/api/classes/{class_id}/chat/{message_id}",
    params(
        ("class_id" = i64, Path, description = "Class ID"),
        ("message_id" = i64, Path, description = "Message ID")
    ),
    responses(
        (status = 200, description = "Message deleted", body = MessageResponse),
        (status = 403, description = "Not the author or a teacher", body = ErrorResponse),
        (status = 404, description = "Message not found", body = ErrorResponse)
    ),
    tag = "Chat",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id()))]
pub async fn delete_message(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((class_id, message_id)): Path<(i64, i64)>,
) -> Result<Json<MessageResponse>, AppError> {
    ChatService::delete_message(state.store(), class_id, message_id, &auth_user.0).await?;
    Ok(Json(MessageResponse::new("Message deleted")))
}
