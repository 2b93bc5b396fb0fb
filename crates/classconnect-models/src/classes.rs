use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Characters a class join code is drawn from.
pub const CLASS_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const CLASS_CODE_LENGTH: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: i64,
    pub class_name: String,
    pub class_code: String,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub theme_color: Option<String>,
    pub created_date: DateTime<Utc>,
    pub is_archived: bool,
    pub creator_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewClass {
    pub class_name: String,
    pub class_code: String,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub theme_color: Option<String>,
    pub creator_id: i64,
    pub created_date: DateTime<Utc>,
}

/// Partial update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ClassChanges {
    pub class_name: Option<String>,
    pub description: Option<String>,
    pub subject: Option<String>,
    pub theme_color: Option<String>,
    pub is_archived: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassRequest {
    #[validate(length(min = 1, max = 100, message = "Class name is required"))]
    pub class_name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub subject: Option<String>,
    #[validate(length(max = 20))]
    pub theme_color: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClassRequest {
    #[validate(length(min = 1, max = 100, message = "Class name cannot be empty"))]
    pub class_name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub subject: Option<String>,
    #[validate(length(max = 20))]
    pub theme_color: Option<String>,
}

impl From<UpdateClassRequest> for ClassChanges {
    fn from(dto: UpdateClassRequest) -> Self {
        Self {
            class_name: dto.class_name,
            description: dto.description,
            subject: dto.subject,
            theme_color: dto.theme_color,
            is_archived: None,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinClassRequest {
    #[validate(length(equal = 6, message = "Class code must be 6 characters"))]
    pub class_code: String,
}

/// A roster entry: an actively enrolled student.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassStudent {
    pub user_id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub grade_level: Option<String>,
    pub joined_date: DateTime<Utc>,
}

impl ClassStudent {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Normalises a user-typed join code.
pub fn normalize_class_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}
