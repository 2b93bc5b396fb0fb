//! Persistence seams.
//!
//! Services only ever see `&dyn Store`; [`crate::PgStore`] backs production
//! and [`crate::MemoryStore`] backs tests and `STORAGE_BACKEND=memory`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use classconnect_models::{
    announcements::{Announcement, AnnouncementChanges, NewAnnouncement},
    assignments::{Assignment, AssignmentChanges, NewAssignment},
    auth::ResetToken,
    chat::{ChatMessage, NewChatMessage},
    classes::{Class, ClassChanges, ClassStudent, NewClass},
    submissions::{GradeUpdate, NewSubmission, Submission},
    users::{NewUser, RoleProfile, User},
};

use crate::error::StoreResult;

pub const EMAIL_TAKEN: &str = "Email already registered";
pub const CLASS_CODE_TAKEN: &str = "Class code already in use";
pub const ALREADY_ENROLLED: &str = "Student is already enrolled in this class";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts the user and its role profile atomically.
    /// A taken email yields `StoreError::Conflict`.
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    async fn find_profile(&self, user: &User) -> StoreResult<Option<RoleProfile>>;

    async fn update_last_login(&self, user_id: i64, at: DateTime<Utc>) -> StoreResult<()>;

    async fn update_password(&self, user_id: i64, password_hash: &str) -> StoreResult<()>;

    async fn set_active(&self, user_id: i64, active: bool) -> StoreResult<()>;

    /// Removes every user whose email ends with `suffix`. Returns the count.
    async fn delete_users_by_email_suffix(&self, suffix: &str) -> StoreResult<u64>;
}

#[async_trait]
pub trait ResetTokenStore: Send + Sync {
    async fn insert_reset_token(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> StoreResult<ResetToken>;

    /// Only returns tokens with `now < expires_at`.
    async fn find_valid_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<ResetToken>>;

    async fn delete_reset_token(&self, id: i64) -> StoreResult<()>;

    async fn delete_reset_tokens_for_user(&self, user_id: i64) -> StoreResult<u64>;
}

#[async_trait]
pub trait ClassStore: Send + Sync {
    /// Inserts the class and its owning teacher row atomically.
    /// A taken code yields `StoreError::Conflict`.
    async fn create_class(&self, new_class: NewClass) -> StoreResult<Class>;

    async fn find_class(&self, id: i64) -> StoreResult<Option<Class>>;

    async fn find_class_by_code(&self, code: &str) -> StoreResult<Option<Class>>;

    async fn class_code_exists(&self, code: &str) -> StoreResult<bool>;

    async fn update_class(&self, id: i64, changes: ClassChanges) -> StoreResult<Option<Class>>;

    async fn delete_class(&self, id: i64) -> StoreResult<bool>;

    async fn classes_for_teacher(&self, teacher_id: i64) -> StoreResult<Vec<Class>>;

    async fn classes_for_student(&self, student_id: i64) -> StoreResult<Vec<Class>>;

    async fn is_class_teacher(&self, class_id: i64, user_id: i64) -> StoreResult<bool>;

    /// Active enrollment only.
    async fn is_enrolled(&self, class_id: i64, student_id: i64) -> StoreResult<bool>;

    /// Creates or reactivates an enrollment. An already active one yields
    /// `StoreError::Conflict`.
    async fn enroll_student(
        &self,
        class_id: i64,
        student_id: i64,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn deactivate_enrollment(&self, class_id: i64, student_id: i64) -> StoreResult<bool>;

    /// Actively enrolled students, ordered by last then first name.
    async fn list_class_students(&self, class_id: i64) -> StoreResult<Vec<ClassStudent>>;
}

#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn create_assignment(&self, new_assignment: NewAssignment) -> StoreResult<Assignment>;

    async fn find_assignment(&self, class_id: i64, id: i64) -> StoreResult<Option<Assignment>>;

    async fn list_assignments(
        &self,
        class_id: i64,
        published_only: bool,
    ) -> StoreResult<Vec<Assignment>>;

    async fn update_assignment(
        &self,
        class_id: i64,
        id: i64,
        changes: AssignmentChanges,
    ) -> StoreResult<Option<Assignment>>;

    async fn delete_assignment(&self, class_id: i64, id: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn find_submission(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> StoreResult<Option<Submission>>;

    /// Inserts, or overwrites the existing row for the pair in place.
    /// Returns `None` without writing when the existing row is graded.
    async fn upsert_submission(&self, submission: NewSubmission)
    -> StoreResult<Option<Submission>>;

    async fn save_grade(
        &self,
        submission_id: i64,
        grade: GradeUpdate,
    ) -> StoreResult<Option<Submission>>;

    async fn list_submissions(&self, assignment_id: i64) -> StoreResult<Vec<Submission>>;

    async fn set_submission_late(&self, submission_id: i64, is_late: bool) -> StoreResult<()>;

    async fn submissions_for_student(
        &self,
        class_id: i64,
        student_id: i64,
    ) -> StoreResult<Vec<Submission>>;
}

#[async_trait]
pub trait AnnouncementStore: Send + Sync {
    async fn create_announcement(
        &self,
        new_announcement: NewAnnouncement,
    ) -> StoreResult<Announcement>;

    /// Newest first.
    async fn list_announcements(&self, class_id: i64) -> StoreResult<Vec<Announcement>>;

    async fn find_announcement(&self, class_id: i64, id: i64)
    -> StoreResult<Option<Announcement>>;

    async fn update_announcement(
        &self,
        class_id: i64,
        id: i64,
        changes: AnnouncementChanges,
    ) -> StoreResult<Option<Announcement>>;

    async fn delete_announcement(&self, class_id: i64, id: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_message(&self, message: NewChatMessage) -> StoreResult<ChatMessage>;

    /// Non-deleted messages, oldest first.
    async fn list_messages(&self, class_id: i64) -> StoreResult<Vec<ChatMessage>>;

    async fn find_message(&self, class_id: i64, id: i64) -> StoreResult<Option<ChatMessage>>;

    async fn soft_delete_message(&self, class_id: i64, id: i64) -> StoreResult<bool>;
}

#[async_trait]
pub trait Store:
    UserStore
    + ResetTokenStore
    + ClassStore
    + AssignmentStore
    + SubmissionStore
    + AnnouncementStore
    + ChatStore
{
    /// Cheap round trip used by the health check.
    async fn ping(&self) -> StoreResult<()>;
}
