use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::users::UserRole;

/// An announcement with its author's display details joined in.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i64,
    pub class_id: i64,
    pub title: String,
    pub content: String,
    pub created_by: i64,
    pub author_name: String,
    pub author_role: UserRole,
    pub created_date: DateTime<Utc>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub is_published: bool,
}

#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub class_id: i64,
    pub title: String,
    pub content: String,
    pub created_by: i64,
    pub created_date: DateTime<Utc>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub is_published: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AnnouncementChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnnouncementRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, max = 10000, message = "Content is required"))]
    pub content: String,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAnnouncementRequest {
    #[validate(length(min = 1, max = 200, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 10000, message = "Content cannot be empty"))]
    pub content: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub is_published: Option<bool>,
}

impl From<UpdateAnnouncementRequest> for AnnouncementChanges {
    fn from(dto: UpdateAnnouncementRequest) -> Self {
        Self {
            title: dto.title,
            content: dto.content,
            scheduled_date: dto.scheduled_date,
            is_published: dto.is_published,
        }
    }
}
