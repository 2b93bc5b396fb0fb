use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;

use classconnect_config::DatabaseConfig;
use classconnect_models::{
    announcements::{Announcement, AnnouncementChanges, NewAnnouncement},
    assignments::{Assignment, AssignmentChanges, NewAssignment},
    auth::ResetToken,
    chat::{ChatMessage, NewChatMessage},
    classes::{Class, ClassChanges, ClassStudent, NewClass},
    submissions::{GradeUpdate, NewSubmission, Submission},
    users::{NewUser, RoleProfile, StudentProfile, TeacherProfile, User, UserRole},
};

use crate::error::{StoreError, StoreResult, map_unique};
use crate::store::{
    ALREADY_ENROLLED, AnnouncementStore, AssignmentStore, CLASS_CODE_TAKEN, ChatStore, ClassStore,
    EMAIL_TAKEN, ResetTokenStore, Store, SubmissionStore, UserStore,
};

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, role, is_active, \
                            date_registered, last_login";

const CLASS_COLUMNS: &str = "c.id, c.class_name, c.class_code, c.description, c.subject, \
                             c.theme_color, c.created_date, c.is_archived, c.creator_id";

const ASSIGNMENT_COLUMNS: &str = "id, class_id, title, description, due_date, points_possible, \
                                  is_published, allow_late_submissions, created_by, created_at";

const SUBMISSION_COLUMNS: &str = "s.id, s.assignment_id, s.student_id, s.content, s.file_url, \
                                  s.submission_date, s.is_late, s.status, s.grade, s.feedback, \
                                  s.graded_by, s.graded_date";

const ANNOUNCEMENT_SELECT: &str = "SELECT a.id, a.class_id, a.title, a.content, a.created_by, \
     u.first_name || ' ' || u.last_name AS author_name, u.role AS author_role, \
     a.created_date, a.scheduled_date, a.is_published \
     FROM announcements a JOIN users u ON u.id = a.created_by";

const CHAT_SELECT: &str = "SELECT m.id, m.class_id, m.user_id, \
     u.first_name || ' ' || u.last_name AS user_name, u.role AS user_role, \
     m.content, m.timestamp, m.is_deleted \
     FROM chat_messages m JOIN users u ON u.id = m.user_id";

/// Opens the Postgres pool described by `config`.
pub async fn init_db_pool(config: &DatabaseConfig) -> StoreResult<PgPool> {
    let url = config
        .require_url()
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await?;

    info!(max_connections = config.max_connections, "Database pool ready");
    Ok(pool)
}

/// Applies pending migrations from `migrations/`.
pub async fn migrate(pool: &PgPool) -> StoreResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, role, is_active, date_registered) \
             VALUES ($1, $2, $3, $4, $5, TRUE, $6) RETURNING {USER_COLUMNS}"
        ))
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(new_user.role)
        .bind(new_user.registered_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique(e, EMAIL_TAKEN))?;

        match new_user.role {
            UserRole::Teacher => {
                sqlx::query(
                    "INSERT INTO teacher_profiles (user_id, first_name, last_name, department, hire_date) \
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(user.id)
                .bind(&new_user.first_name)
                .bind(&new_user.last_name)
                .bind(&new_user.department)
                .bind(new_user.registered_at)
                .execute(&mut *tx)
                .await?;
            }
            UserRole::Student => {
                sqlx::query(
                    "INSERT INTO student_profiles (user_id, first_name, last_name, grade_level, enrollment_date) \
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(user.id)
                .bind(&new_user.first_name)
                .bind(&new_user.last_name)
                .bind(&new_user.grade_level)
                .bind(new_user.registered_at)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_profile(&self, user: &User) -> StoreResult<Option<RoleProfile>> {
        let profile = match user.role {
            UserRole::Teacher => sqlx::query_as::<_, TeacherProfile>(
                "SELECT user_id, first_name, last_name, department, hire_date \
                 FROM teacher_profiles WHERE user_id = $1",
            )
            .bind(user.id)
            .fetch_optional(&self.pool)
            .await?
            .map(RoleProfile::Teacher),
            UserRole::Student => sqlx::query_as::<_, StudentProfile>(
                "SELECT user_id, first_name, last_name, grade_level, enrollment_date \
                 FROM student_profiles WHERE user_id = $1",
            )
            .bind(user.id)
            .fetch_optional(&self.pool)
            .await?
            .map(RoleProfile::Student),
        };
        Ok(profile)
    }

    async fn update_last_login(&self, user_id: i64, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
            .bind(user_id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_password(&self, user_id: i64, password_hash: &str) -> StoreResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_active(&self, user_id: i64, active: bool) -> StoreResult<()> {
        sqlx::query("UPDATE users SET is_active = $2 WHERE id = $1")
            .bind(user_id)
            .bind(active)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_users_by_email_suffix(&self, suffix: &str) -> StoreResult<u64> {
        let mut tx = self.pool.begin().await?;
        let pattern = format!("%{suffix}");

        // Rows that reference users without ON DELETE CASCADE.
        sqlx::query(
            "DELETE FROM classes WHERE creator_id IN (SELECT id FROM users WHERE email LIKE $1)",
        )
        .bind(&pattern)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "DELETE FROM announcements WHERE created_by IN (SELECT id FROM users WHERE email LIKE $1)",
        )
        .bind(&pattern)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "DELETE FROM assignments WHERE created_by IN (SELECT id FROM users WHERE email LIKE $1)",
        )
        .bind(&pattern)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            "UPDATE submissions SET graded_by = NULL, graded_date = NULL, grade = NULL, status = 'submitted' \
             WHERE graded_by IN (SELECT id FROM users WHERE email LIKE $1)",
        )
        .bind(&pattern)
        .execute(&mut *tx)
        .await?;

        let deleted = sqlx::query("DELETE FROM users WHERE email LIKE $1")
            .bind(&pattern)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted)
    }
}

#[async_trait]
impl ResetTokenStore for PgStore {
    async fn insert_reset_token(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> StoreResult<ResetToken> {
        let row = sqlx::query_as::<_, ResetToken>(
            "INSERT INTO password_resets (user_id, token, expires_at, created_at) \
             VALUES ($1, $2, $3, $4) RETURNING id, user_id, token, expires_at, created_at",
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_valid_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<ResetToken>> {
        let row = sqlx::query_as::<_, ResetToken>(
            "SELECT id, user_id, token, expires_at, created_at FROM password_resets \
             WHERE token = $1 AND expires_at > $2",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_reset_token(&self, id: i64) -> StoreResult<()> {
        sqlx::query("DELETE FROM password_resets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_reset_tokens_for_user(&self, user_id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM password_resets WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ClassStore for PgStore {
    async fn create_class(&self, new_class: NewClass) -> StoreResult<Class> {
        let mut tx = self.pool.begin().await?;

        let class = sqlx::query_as::<_, Class>(
            "INSERT INTO classes AS c (class_name, class_code, description, subject, theme_color, created_date, creator_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING c.id, c.class_name, c.class_code, c.description, c.subject, c.theme_color, \
                       c.created_date, c.is_archived, c.creator_id",
        )
        .bind(&new_class.class_name)
        .bind(&new_class.class_code)
        .bind(&new_class.description)
        .bind(&new_class.subject)
        .bind(&new_class.theme_color)
        .bind(new_class.created_date)
        .bind(new_class.creator_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique(e, CLASS_CODE_TAKEN))?;

        sqlx::query(
            "INSERT INTO class_teachers (class_id, teacher_id, is_owner, added_date) VALUES ($1, $2, TRUE, $3)",
        )
        .bind(class.id)
        .bind(new_class.creator_id)
        .bind(new_class.created_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(class)
    }

    async fn find_class(&self, id: i64) -> StoreResult<Option<Class>> {
        let class = sqlx::query_as::<_, Class>(&format!(
            "SELECT {CLASS_COLUMNS} FROM classes c WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(class)
    }

    async fn find_class_by_code(&self, code: &str) -> StoreResult<Option<Class>> {
        let class = sqlx::query_as::<_, Class>(&format!(
            "SELECT {CLASS_COLUMNS} FROM classes c WHERE c.class_code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(class)
    }

    async fn class_code_exists(&self, code: &str) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM classes WHERE class_code = $1)")
                .bind(code)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn update_class(&self, id: i64, changes: ClassChanges) -> StoreResult<Option<Class>> {
        let class = sqlx::query_as::<_, Class>(
            "UPDATE classes AS c SET \
                 class_name = COALESCE($2, c.class_name), \
                 description = COALESCE($3, c.description), \
                 subject = COALESCE($4, c.subject), \
                 theme_color = COALESCE($5, c.theme_color), \
                 is_archived = COALESCE($6, c.is_archived) \
             WHERE c.id = $1 \
             RETURNING c.id, c.class_name, c.class_code, c.description, c.subject, c.theme_color, \
                       c.created_date, c.is_archived, c.creator_id",
        )
        .bind(id)
        .bind(changes.class_name)
        .bind(changes.description)
        .bind(changes.subject)
        .bind(changes.theme_color)
        .bind(changes.is_archived)
        .fetch_optional(&self.pool)
        .await?;
        Ok(class)
    }

    async fn delete_class(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn classes_for_teacher(&self, teacher_id: i64) -> StoreResult<Vec<Class>> {
        let classes = sqlx::query_as::<_, Class>(&format!(
            "SELECT {CLASS_COLUMNS} FROM classes c \
             JOIN class_teachers ct ON ct.class_id = c.id \
             WHERE ct.teacher_id = $1 ORDER BY c.created_date DESC, c.id DESC"
        ))
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(classes)
    }

    async fn classes_for_student(&self, student_id: i64) -> StoreResult<Vec<Class>> {
        let classes = sqlx::query_as::<_, Class>(&format!(
            "SELECT {CLASS_COLUMNS} FROM classes c \
             JOIN class_enrollments e ON e.class_id = c.id \
             WHERE e.student_id = $1 AND e.is_active ORDER BY c.created_date DESC, c.id DESC"
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(classes)
    }

    async fn is_class_teacher(&self, class_id: i64, user_id: i64) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM class_teachers WHERE class_id = $1 AND teacher_id = $2)",
        )
        .bind(class_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn is_enrolled(&self, class_id: i64, student_id: i64) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM class_enrollments \
             WHERE class_id = $1 AND student_id = $2 AND is_active)",
        )
        .bind(class_id)
        .bind(student_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn enroll_student(
        &self,
        class_id: i64,
        student_id: i64,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "INSERT INTO class_enrollments (class_id, student_id, joined_date, is_active) \
             VALUES ($1, $2, $3, TRUE) \
             ON CONFLICT (class_id, student_id) DO UPDATE \
             SET is_active = TRUE, joined_date = EXCLUDED.joined_date \
             WHERE class_enrollments.is_active = FALSE",
        )
        .bind(class_id)
        .bind(student_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(ALREADY_ENROLLED.to_string()));
        }
        Ok(())
    }

    async fn deactivate_enrollment(&self, class_id: i64, student_id: i64) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE class_enrollments SET is_active = FALSE \
             WHERE class_id = $1 AND student_id = $2 AND is_active",
        )
        .bind(class_id)
        .bind(student_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_class_students(&self, class_id: i64) -> StoreResult<Vec<ClassStudent>> {
        let students = sqlx::query_as::<_, ClassStudent>(
            "SELECT u.id AS user_id, u.email, \
                    COALESCE(sp.first_name, u.first_name) AS first_name, \
                    COALESCE(sp.last_name, u.last_name) AS last_name, \
                    sp.grade_level, e.joined_date \
             FROM class_enrollments e \
             JOIN users u ON u.id = e.student_id \
             LEFT JOIN student_profiles sp ON sp.user_id = u.id \
             WHERE e.class_id = $1 AND e.is_active \
             ORDER BY 4, 3, 1",
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(students)
    }
}

#[async_trait]
impl AssignmentStore for PgStore {
    async fn create_assignment(&self, new_assignment: NewAssignment) -> StoreResult<Assignment> {
        let assignment = sqlx::query_as::<_, Assignment>(&format!(
            "INSERT INTO assignments (class_id, title, description, due_date, points_possible, \
                                      is_published, allow_late_submissions, created_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {ASSIGNMENT_COLUMNS}"
        ))
        .bind(new_assignment.class_id)
        .bind(&new_assignment.title)
        .bind(&new_assignment.description)
        .bind(new_assignment.due_date)
        .bind(new_assignment.points_possible)
        .bind(new_assignment.is_published)
        .bind(new_assignment.allow_late_submissions)
        .bind(new_assignment.created_by)
        .bind(new_assignment.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(assignment)
    }

    async fn find_assignment(&self, class_id: i64, id: i64) -> StoreResult<Option<Assignment>> {
        let assignment = sqlx::query_as::<_, Assignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE class_id = $1 AND id = $2"
        ))
        .bind(class_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(assignment)
    }

    async fn list_assignments(
        &self,
        class_id: i64,
        published_only: bool,
    ) -> StoreResult<Vec<Assignment>> {
        let assignments = sqlx::query_as::<_, Assignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments \
             WHERE class_id = $1 AND (is_published OR NOT $2) \
             ORDER BY due_date ASC NULLS LAST, id ASC"
        ))
        .bind(class_id)
        .bind(published_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(assignments)
    }

    async fn update_assignment(
        &self,
        class_id: i64,
        id: i64,
        changes: AssignmentChanges,
    ) -> StoreResult<Option<Assignment>> {
        let (set_due_date, due_date) = match changes.due_date {
            Some(value) => (true, value),
            None => (false, None),
        };

        let assignment = sqlx::query_as::<_, Assignment>(&format!(
            "UPDATE assignments SET \
                 title = COALESCE($3, title), \
                 description = COALESCE($4, description), \
                 due_date = CASE WHEN $5 THEN $6 ELSE due_date END, \
                 points_possible = COALESCE($7, points_possible), \
                 is_published = COALESCE($8, is_published), \
                 allow_late_submissions = COALESCE($9, allow_late_submissions) \
             WHERE class_id = $1 AND id = $2 RETURNING {ASSIGNMENT_COLUMNS}"
        ))
        .bind(class_id)
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(set_due_date)
        .bind(due_date)
        .bind(changes.points_possible)
        .bind(changes.is_published)
        .bind(changes.allow_late_submissions)
        .fetch_optional(&self.pool)
        .await?;
        Ok(assignment)
    }

    async fn delete_assignment(&self, class_id: i64, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM assignments WHERE class_id = $1 AND id = $2")
            .bind(class_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SubmissionStore for PgStore {
    async fn find_submission(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> StoreResult<Option<Submission>> {
        let submission = sqlx::query_as::<_, Submission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions s \
             WHERE s.assignment_id = $1 AND s.student_id = $2"
        ))
        .bind(assignment_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(submission)
    }

    async fn upsert_submission(
        &self,
        submission: NewSubmission,
    ) -> StoreResult<Option<Submission>> {
        let saved = sqlx::query_as::<_, Submission>(&format!(
            "INSERT INTO submissions AS s (assignment_id, student_id, content, file_url, \
                                           submission_date, is_late, status) \
             VALUES ($1, $2, $3, $4, $5, $6, 'submitted') \
             ON CONFLICT (assignment_id, student_id) DO UPDATE SET \
                 content = EXCLUDED.content, \
                 file_url = EXCLUDED.file_url, \
                 submission_date = EXCLUDED.submission_date, \
                 is_late = EXCLUDED.is_late, \
                 status = 'submitted' \
             WHERE s.status <> 'graded' \
             RETURNING {SUBMISSION_COLUMNS}"
        ))
        .bind(submission.assignment_id)
        .bind(submission.student_id)
        .bind(&submission.content)
        .bind(&submission.file_url)
        .bind(submission.submission_date)
        .bind(submission.is_late)
        .fetch_optional(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn save_grade(
        &self,
        submission_id: i64,
        grade: GradeUpdate,
    ) -> StoreResult<Option<Submission>> {
        let saved = sqlx::query_as::<_, Submission>(&format!(
            "UPDATE submissions AS s SET \
                 status = 'graded', grade = $2, feedback = $3, graded_by = $4, graded_date = $5 \
             WHERE s.id = $1 RETURNING {SUBMISSION_COLUMNS}"
        ))
        .bind(submission_id)
        .bind(grade.grade)
        .bind(&grade.feedback)
        .bind(grade.graded_by)
        .bind(grade.graded_date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn list_submissions(&self, assignment_id: i64) -> StoreResult<Vec<Submission>> {
        let submissions = sqlx::query_as::<_, Submission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions s \
             WHERE s.assignment_id = $1 ORDER BY s.student_id"
        ))
        .bind(assignment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(submissions)
    }

    async fn set_submission_late(&self, submission_id: i64, is_late: bool) -> StoreResult<()> {
        sqlx::query("UPDATE submissions SET is_late = $2 WHERE id = $1")
            .bind(submission_id)
            .bind(is_late)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn submissions_for_student(
        &self,
        class_id: i64,
        student_id: i64,
    ) -> StoreResult<Vec<Submission>> {
        let submissions = sqlx::query_as::<_, Submission>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions s \
             JOIN assignments a ON a.id = s.assignment_id \
             WHERE a.class_id = $1 AND s.student_id = $2"
        ))
        .bind(class_id)
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(submissions)
    }
}

#[async_trait]
impl AnnouncementStore for PgStore {
    async fn create_announcement(
        &self,
        new_announcement: NewAnnouncement,
    ) -> StoreResult<Announcement> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO announcements (class_id, title, content, created_by, created_date, \
                                        scheduled_date, is_published) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(new_announcement.class_id)
        .bind(&new_announcement.title)
        .bind(&new_announcement.content)
        .bind(new_announcement.created_by)
        .bind(new_announcement.created_date)
        .bind(new_announcement.scheduled_date)
        .bind(new_announcement.is_published)
        .fetch_one(&self.pool)
        .await?;

        self.find_announcement(new_announcement.class_id, id)
            .await?
            .ok_or_else(|| StoreError::Unavailable(format!("announcement {id} vanished")))
    }

    async fn list_announcements(&self, class_id: i64) -> StoreResult<Vec<Announcement>> {
        let announcements = sqlx::query_as::<_, Announcement>(&format!(
            "{ANNOUNCEMENT_SELECT} WHERE a.class_id = $1 ORDER BY a.created_date DESC, a.id DESC"
        ))
        .bind(class_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(announcements)
    }

    async fn find_announcement(
        &self,
        class_id: i64,
        id: i64,
    ) -> StoreResult<Option<Announcement>> {
        let announcement = sqlx::query_as::<_, Announcement>(&format!(
            "{ANNOUNCEMENT_SELECT} WHERE a.class_id = $1 AND a.id = $2"
        ))
        .bind(class_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(announcement)
    }

    async fn update_announcement(
        &self,
        class_id: i64,
        id: i64,
        changes: AnnouncementChanges,
    ) -> StoreResult<Option<Announcement>> {
        let result = sqlx::query(
            "UPDATE announcements SET \
                 title = COALESCE($3, title), \
                 content = COALESCE($4, content), \
                 scheduled_date = COALESCE($5, scheduled_date), \
                 is_published = COALESCE($6, is_published) \
             WHERE class_id = $1 AND id = $2",
        )
        .bind(class_id)
        .bind(id)
        .bind(changes.title)
        .bind(changes.content)
        .bind(changes.scheduled_date)
        .bind(changes.is_published)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_announcement(class_id, id).await
    }

    async fn delete_announcement(&self, class_id: i64, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM announcements WHERE class_id = $1 AND id = $2")
            .bind(class_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ChatStore for PgStore {
    async fn create_message(&self, message: NewChatMessage) -> StoreResult<ChatMessage> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO chat_messages (class_id, user_id, content, timestamp) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(message.class_id)
        .bind(message.user_id)
        .bind(&message.content)
        .bind(message.timestamp)
        .fetch_one(&self.pool)
        .await?;

        self.find_message(message.class_id, id)
            .await?
            .ok_or_else(|| StoreError::Unavailable(format!("chat message {id} vanished")))
    }

    async fn list_messages(&self, class_id: i64) -> StoreResult<Vec<ChatMessage>> {
        let messages = sqlx::query_as::<_, ChatMessage>(&format!(
            "{CHAT_SELECT} WHERE m.class_id = $1 AND NOT m.is_deleted \
             ORDER BY m.timestamp ASC, m.id ASC"
        ))
        .bind(class_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    async fn find_message(&self, class_id: i64, id: i64) -> StoreResult<Option<ChatMessage>> {
        let message = sqlx::query_as::<_, ChatMessage>(&format!(
            "{CHAT_SELECT} WHERE m.class_id = $1 AND m.id = $2 AND NOT m.is_deleted"
        ))
        .bind(class_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(message)
    }

    async fn soft_delete_message(&self, class_id: i64, id: i64) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE chat_messages SET is_deleted = TRUE \
             WHERE class_id = $1 AND id = $2 AND NOT is_deleted",
        )
        .bind(class_id)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 8, 0, 0).unwrap()
    }

    fn new_user(email: &str, role: UserRole) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role,
            department: (role == UserRole::Teacher).then(|| "Science".to_string()),
            grade_level: (role == UserRole::Student).then(|| "10".to_string()),
            registered_at: at(1),
        }
    }

    fn new_class(code: &str, creator_id: i64) -> NewClass {
        NewClass {
            class_name: "Chemistry".to_string(),
            class_code: code.to_string(),
            description: None,
            subject: Some("Science".to_string()),
            theme_color: None,
            creator_id,
            created_date: at(1),
        }
    }

    async fn classroom(store: &PgStore) -> (i64, i64, i64) {
        let teacher = store
            .create_user(new_user("teacher@school.test", UserRole::Teacher))
            .await
            .unwrap();
        let student = store
            .create_user(new_user("student@school.test", UserRole::Student))
            .await
            .unwrap();
        let class = store
            .create_class(new_class("CHM101", teacher.id))
            .await
            .unwrap();
        (teacher.id, student.id, class.id)
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_create_user_writes_profile_and_rejects_duplicate_email(pool: PgPool) {
        let store = PgStore::new(pool);

        let teacher = store
            .create_user(new_user("teacher@school.test", UserRole::Teacher))
            .await
            .unwrap();
        assert_eq!(teacher.role, UserRole::Teacher);
        assert!(teacher.is_active);

        let profile = store.find_profile(&teacher).await.unwrap();
        assert!(matches!(profile, Some(RoleProfile::Teacher(p)) if p.user_id == teacher.id));

        let err = store
            .create_user(new_user("teacher@school.test", UserRole::Student))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(matches!(err, StoreError::Conflict(ref msg) if msg == EMAIL_TAKEN));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_create_class_registers_owner_and_rejects_duplicate_code(pool: PgPool) {
        let store = PgStore::new(pool);
        let (teacher_id, student_id, class_id) = classroom(&store).await;

        assert!(store.is_class_teacher(class_id, teacher_id).await.unwrap());
        assert!(!store.is_class_teacher(class_id, student_id).await.unwrap());
        assert!(store.class_code_exists("CHM101").await.unwrap());

        let err = store
            .create_class(new_class("CHM101", teacher_id))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ref msg) if msg == CLASS_CODE_TAKEN));
        assert_eq!(store.classes_for_teacher(teacher_id).await.unwrap().len(), 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_rejoin_after_removal_reactivates_enrollment(pool: PgPool) {
        let store = PgStore::new(pool);
        let (_, student_id, class_id) = classroom(&store).await;

        store.enroll_student(class_id, student_id, at(2)).await.unwrap();
        assert!(store.is_enrolled(class_id, student_id).await.unwrap());

        let err = store
            .enroll_student(class_id, student_id, at(3))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ref msg) if msg == ALREADY_ENROLLED));

        assert!(store.deactivate_enrollment(class_id, student_id).await.unwrap());
        assert!(!store.is_enrolled(class_id, student_id).await.unwrap());
        assert!(!store.deactivate_enrollment(class_id, student_id).await.unwrap());

        store.enroll_student(class_id, student_id, at(4)).await.unwrap();
        assert!(store.is_enrolled(class_id, student_id).await.unwrap());
        assert_eq!(store.list_class_students(class_id).await.unwrap().len(), 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_upsert_submission_stops_once_graded(pool: PgPool) {
        let store = PgStore::new(pool);
        let (teacher_id, student_id, class_id) = classroom(&store).await;
        store.enroll_student(class_id, student_id, at(2)).await.unwrap();

        let assignment = store
            .create_assignment(NewAssignment {
                class_id,
                title: "Titration lab".to_string(),
                description: None,
                due_date: Some(at(10)),
                points_possible: 100,
                is_published: true,
                allow_late_submissions: true,
                created_by: teacher_id,
                created_at: at(2),
            })
            .await
            .unwrap();

        let submission = |content: &str, day: u32| NewSubmission {
            assignment_id: assignment.id,
            student_id,
            content: Some(content.to_string()),
            file_url: None,
            submission_date: at(day),
            is_late: day > 10,
        };

        let first = store
            .upsert_submission(submission("draft", 3))
            .await
            .unwrap()
            .unwrap();
        let second = store
            .upsert_submission(submission("final", 12))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.content.as_deref(), Some("final"));
        assert!(second.is_late);

        let graded = store
            .save_grade(
                second.id,
                GradeUpdate {
                    grade: 88,
                    feedback: Some("Good work".to_string()),
                    graded_by: teacher_id,
                    graded_date: at(13),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(graded.grade, Some(88));

        let blocked = store
            .upsert_submission(submission("sneaky edit", 14))
            .await
            .unwrap();
        assert!(blocked.is_none());

        let stored = store
            .find_submission(assignment.id, student_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.content.as_deref(), Some("final"));
        assert_eq!(stored.grade, Some(88));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_expired_reset_token_is_not_found(pool: PgPool) {
        let store = PgStore::new(pool);
        let user = store
            .create_user(new_user("student@school.test", UserRole::Student))
            .await
            .unwrap();

        let issued = at(1);
        store
            .insert_reset_token(user.id, "live-token", issued + Duration::hours(1), issued)
            .await
            .unwrap();

        let found = store
            .find_valid_reset_token("live-token", issued + Duration::minutes(30))
            .await
            .unwrap();
        assert_eq!(found.map(|t| t.user_id), Some(user.id));

        let expired = store
            .find_valid_reset_token("live-token", issued + Duration::hours(2))
            .await
            .unwrap();
        assert!(expired.is_none());

        assert_eq!(store.delete_reset_tokens_for_user(user.id).await.unwrap(), 1);
    }
}
