use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::submissions::SubmissionStatus;

pub const DEFAULT_POINTS_POSSIBLE: i32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: i64,
    pub class_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub points_possible: i32,
    pub is_published: bool,
    pub allow_late_submissions: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub class_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub points_possible: i32,
    pub is_published: bool,
    pub allow_late_submissions: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

/// Partial update. For `due_date`, `Some(None)` clears the deadline.
#[derive(Debug, Clone, Default)]
pub struct AssignmentChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub points_possible: Option<i32>,
    pub is_published: Option<bool>,
    pub allow_late_submissions: Option<bool>,
}

impl AssignmentChanges {
    /// The new deadline if this update actually moves it.
    pub fn due_date_change(&self, current: &Assignment) -> Option<Option<DateTime<Utc>>> {
        self.due_date.filter(|next| *next != current.due_date)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    #[validate(range(min = 1, message = "Points possible must be positive"))]
    pub points_possible: Option<i32>,
    pub is_published: Option<bool>,
    pub allow_late_submissions: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentRequest {
    #[validate(length(min = 1, max = 200, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    /// Absent: unchanged. `null`: remove the deadline.
    #[serde(default, deserialize_with = "deserialize_present")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[validate(range(min = 1, message = "Points possible must be positive"))]
    pub points_possible: Option<i32>,
    pub is_published: Option<bool>,
    pub allow_late_submissions: Option<bool>,
}

/// Marks a field as present even when its value is `null`.
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl From<UpdateAssignmentRequest> for AssignmentChanges {
    fn from(dto: UpdateAssignmentRequest) -> Self {
        Self {
            title: dto.title,
            description: dto.description,
            due_date: dto.due_date,
            points_possible: dto.points_possible,
            is_published: dto.is_published,
            allow_late_submissions: dto.allow_late_submissions,
        }
    }
}

/// An assignment as listed to a user. Students also get their own status
/// and grade.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    #[serde(flatten)]
    pub assignment: Assignment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubmissionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<i32>,
}

impl From<Assignment> for AssignmentResponse {
    fn from(assignment: Assignment) -> Self {
        Self {
            assignment,
            status: None,
            grade: None,
        }
    }
}
