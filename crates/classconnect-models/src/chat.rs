use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::users::UserRole;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i64,
    pub class_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_role: UserRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip)]
    pub is_deleted: bool,
}

#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub class_id: i64,
    pub user_id: i64,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 2000, message = "Message must be between 1 and 2000 characters"))]
    pub content: String,
}
