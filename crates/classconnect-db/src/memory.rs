//! In-process store.
//!
//! Everything lives behind one mutex, so each trait call is a single critical
//! section. Data is lost when the process exits.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use classconnect_models::{
    announcements::{Announcement, AnnouncementChanges, NewAnnouncement},
    assignments::{Assignment, AssignmentChanges, NewAssignment},
    auth::ResetToken,
    chat::{ChatMessage, NewChatMessage},
    classes::{Class, ClassChanges, ClassStudent, NewClass},
    submissions::{GradeUpdate, NewSubmission, Submission, SubmissionStatus},
    users::{NewUser, RoleProfile, StudentProfile, TeacherProfile, User, UserRole},
};

use crate::error::{StoreError, StoreResult};
use crate::store::{
    ALREADY_ENROLLED, AnnouncementStore, AssignmentStore, CLASS_CODE_TAKEN, ChatStore, ClassStore,
    EMAIL_TAKEN, ResetTokenStore, Store, SubmissionStore, UserStore,
};

#[derive(Debug, Clone)]
struct Enrollment {
    joined_date: DateTime<Utc>,
    is_active: bool,
}

#[derive(Debug, Clone)]
struct AnnouncementRow {
    id: i64,
    class_id: i64,
    title: String,
    content: String,
    created_by: i64,
    created_date: DateTime<Utc>,
    scheduled_date: Option<DateTime<Utc>>,
    is_published: bool,
}

#[derive(Debug, Clone)]
struct ChatRow {
    id: i64,
    class_id: i64,
    user_id: i64,
    content: String,
    timestamp: DateTime<Utc>,
    is_deleted: bool,
}

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    users: HashMap<i64, User>,
    teacher_profiles: HashMap<i64, TeacherProfile>,
    student_profiles: HashMap<i64, StudentProfile>,
    reset_tokens: HashMap<i64, ResetToken>,
    classes: HashMap<i64, Class>,
    /// (class_id, teacher_id)
    class_teachers: Vec<(i64, i64)>,
    enrollments: HashMap<(i64, i64), Enrollment>,
    assignments: HashMap<i64, Assignment>,
    submissions: HashMap<i64, Submission>,
    announcements: HashMap<i64, AnnouncementRow>,
    chat_messages: HashMap<i64, ChatRow>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn author(&self, user_id: i64) -> (String, UserRole) {
        match self.users.get(&user_id) {
            Some(user) => (user.full_name(), user.role),
            None => (format!("User #{user_id}"), UserRole::Student),
        }
    }

    fn announcement(&self, row: &AnnouncementRow) -> Announcement {
        let (author_name, author_role) = self.author(row.created_by);
        Announcement {
            id: row.id,
            class_id: row.class_id,
            title: row.title.clone(),
            content: row.content.clone(),
            created_by: row.created_by,
            author_name,
            author_role,
            created_date: row.created_date,
            scheduled_date: row.scheduled_date,
            is_published: row.is_published,
        }
    }

    fn chat_message(&self, row: &ChatRow) -> ChatMessage {
        let (user_name, user_role) = self.author(row.user_id);
        ChatMessage {
            id: row.id,
            class_id: row.class_id,
            user_id: row.user_id,
            user_name,
            user_role,
            content: row.content.clone(),
            timestamp: row.timestamp,
            is_deleted: row.is_deleted,
        }
    }

    fn remove_class(&mut self, class_id: i64) {
        self.classes.remove(&class_id);
        self.class_teachers.retain(|(c, _)| *c != class_id);
        self.enrollments.retain(|(c, _), _| *c != class_id);
        self.announcements.retain(|_, a| a.class_id != class_id);
        self.chat_messages.retain(|_, m| m.class_id != class_id);

        let assignment_ids: Vec<i64> = self
            .assignments
            .values()
            .filter(|a| a.class_id == class_id)
            .map(|a| a.id)
            .collect();
        for id in assignment_ids {
            self.remove_assignment(id);
        }
    }

    fn remove_assignment(&mut self, assignment_id: i64) {
        self.assignments.remove(&assignment_id);
        self.submissions.retain(|_, s| s.assignment_id != assignment_id);
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let id = tables.next_id();
        let user = User {
            id,
            email: new_user.email,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name.clone(),
            last_name: new_user.last_name.clone(),
            role: new_user.role,
            is_active: true,
            date_registered: new_user.registered_at,
            last_login: None,
        };

        match new_user.role {
            UserRole::Teacher => {
                tables.teacher_profiles.insert(
                    id,
                    TeacherProfile {
                        user_id: id,
                        first_name: new_user.first_name,
                        last_name: new_user.last_name,
                        department: new_user.department,
                        hire_date: new_user.registered_at,
                    },
                );
            }
            UserRole::Student => {
                tables.student_profiles.insert(
                    id,
                    StudentProfile {
                        user_id: id,
                        first_name: new_user.first_name,
                        last_name: new_user.last_name,
                        grade_level: new_user.grade_level,
                        enrollment_date: new_user.registered_at,
                    },
                );
            }
        }

        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.lock()?;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_profile(&self, user: &User) -> StoreResult<Option<RoleProfile>> {
        let tables = self.lock()?;
        let profile = match user.role {
            UserRole::Teacher => tables
                .teacher_profiles
                .get(&user.id)
                .cloned()
                .map(RoleProfile::Teacher),
            UserRole::Student => tables
                .student_profiles
                .get(&user.id)
                .cloned()
                .map(RoleProfile::Student),
        };
        Ok(profile)
    }

    async fn update_last_login(&self, user_id: i64, at: DateTime<Utc>) -> StoreResult<()> {
        if let Some(user) = self.lock()?.users.get_mut(&user_id) {
            user.last_login = Some(at);
        }
        Ok(())
    }

    async fn update_password(&self, user_id: i64, password_hash: &str) -> StoreResult<()> {
        if let Some(user) = self.lock()?.users.get_mut(&user_id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn set_active(&self, user_id: i64, active: bool) -> StoreResult<()> {
        if let Some(user) = self.lock()?.users.get_mut(&user_id) {
            user.is_active = active;
        }
        Ok(())
    }

    async fn delete_users_by_email_suffix(&self, suffix: &str) -> StoreResult<u64> {
        let mut tables = self.lock()?;
        let ids: Vec<i64> = tables
            .users
            .values()
            .filter(|u| u.email.ends_with(suffix))
            .map(|u| u.id)
            .collect();

        for id in &ids {
            let owned: Vec<i64> = tables
                .classes
                .values()
                .filter(|c| c.creator_id == *id)
                .map(|c| c.id)
                .collect();
            for class_id in owned {
                tables.remove_class(class_id);
            }

            tables.users.remove(id);
            tables.teacher_profiles.remove(id);
            tables.student_profiles.remove(id);
            tables.reset_tokens.retain(|_, t| t.user_id != *id);
            tables.class_teachers.retain(|(_, t)| t != id);
            tables.enrollments.retain(|(_, s), _| s != id);
            tables.submissions.retain(|_, s| s.student_id != *id);
            tables.chat_messages.retain(|_, m| m.user_id != *id);
            tables.announcements.retain(|_, a| a.created_by != *id);
        }

        Ok(ids.len() as u64)
    }
}

#[async_trait]
impl ResetTokenStore for MemoryStore {
    async fn insert_reset_token(
        &self,
        user_id: i64,
        token: &str,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> StoreResult<ResetToken> {
        let mut tables = self.lock()?;
        let id = tables.next_id();
        let row = ResetToken {
            id,
            user_id,
            token: token.to_string(),
            expires_at,
            created_at,
        };
        tables.reset_tokens.insert(id, row.clone());
        Ok(row)
    }

    async fn find_valid_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<ResetToken>> {
        let tables = self.lock()?;
        Ok(tables
            .reset_tokens
            .values()
            .find(|t| t.token == token && t.is_valid_at(now))
            .cloned())
    }

    async fn delete_reset_token(&self, id: i64) -> StoreResult<()> {
        self.lock()?.reset_tokens.remove(&id);
        Ok(())
    }

    async fn delete_reset_tokens_for_user(&self, user_id: i64) -> StoreResult<u64> {
        let mut tables = self.lock()?;
        let before = tables.reset_tokens.len();
        tables.reset_tokens.retain(|_, t| t.user_id != user_id);
        Ok((before - tables.reset_tokens.len()) as u64)
    }
}

#[async_trait]
impl ClassStore for MemoryStore {
    async fn create_class(&self, new_class: NewClass) -> StoreResult<Class> {
        let mut tables = self.lock()?;
        if tables
            .classes
            .values()
            .any(|c| c.class_code == new_class.class_code)
        {
            return Err(StoreError::Conflict(CLASS_CODE_TAKEN.to_string()));
        }

        let id = tables.next_id();
        let class = Class {
            id,
            class_name: new_class.class_name,
            class_code: new_class.class_code,
            description: new_class.description,
            subject: new_class.subject,
            theme_color: new_class.theme_color,
            created_date: new_class.created_date,
            is_archived: false,
            creator_id: new_class.creator_id,
        };
        tables.classes.insert(id, class.clone());
        tables.class_teachers.push((id, new_class.creator_id));
        Ok(class)
    }

    async fn find_class(&self, id: i64) -> StoreResult<Option<Class>> {
        Ok(self.lock()?.classes.get(&id).cloned())
    }

    async fn find_class_by_code(&self, code: &str) -> StoreResult<Option<Class>> {
        let tables = self.lock()?;
        Ok(tables
            .classes
            .values()
            .find(|c| c.class_code == code)
            .cloned())
    }

    async fn class_code_exists(&self, code: &str) -> StoreResult<bool> {
        let tables = self.lock()?;
        Ok(tables.classes.values().any(|c| c.class_code == code))
    }

    async fn update_class(&self, id: i64, changes: ClassChanges) -> StoreResult<Option<Class>> {
        let mut tables = self.lock()?;
        let Some(class) = tables.classes.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(class_name) = changes.class_name {
            class.class_name = class_name;
        }
        if let Some(description) = changes.description {
            class.description = Some(description);
        }
        if let Some(subject) = changes.subject {
            class.subject = Some(subject);
        }
        if let Some(theme_color) = changes.theme_color {
            class.theme_color = Some(theme_color);
        }
        if let Some(is_archived) = changes.is_archived {
            class.is_archived = is_archived;
        }
        Ok(Some(class.clone()))
    }

    async fn delete_class(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        if !tables.classes.contains_key(&id) {
            return Ok(false);
        }
        tables.remove_class(id);
        Ok(true)
    }

    async fn classes_for_teacher(&self, teacher_id: i64) -> StoreResult<Vec<Class>> {
        let tables = self.lock()?;
        let mut classes: Vec<Class> = tables
            .class_teachers
            .iter()
            .filter(|(_, t)| *t == teacher_id)
            .filter_map(|(c, _)| tables.classes.get(c).cloned())
            .collect();
        classes.sort_by(|a, b| (b.created_date, b.id).cmp(&(a.created_date, a.id)));
        Ok(classes)
    }

    async fn classes_for_student(&self, student_id: i64) -> StoreResult<Vec<Class>> {
        let tables = self.lock()?;
        let mut classes: Vec<Class> = tables
            .enrollments
            .iter()
            .filter(|((_, s), e)| *s == student_id && e.is_active)
            .filter_map(|((c, _), _)| tables.classes.get(c).cloned())
            .collect();
        classes.sort_by(|a, b| (b.created_date, b.id).cmp(&(a.created_date, a.id)));
        Ok(classes)
    }

    async fn is_class_teacher(&self, class_id: i64, user_id: i64) -> StoreResult<bool> {
        let tables = self.lock()?;
        Ok(tables.class_teachers.contains(&(class_id, user_id)))
    }

    async fn is_enrolled(&self, class_id: i64, student_id: i64) -> StoreResult<bool> {
        let tables = self.lock()?;
        Ok(tables
            .enrollments
            .get(&(class_id, student_id))
            .is_some_and(|e| e.is_active))
    }

    async fn enroll_student(
        &self,
        class_id: i64,
        student_id: i64,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut tables = self.lock()?;
        let enrollment = tables
            .enrollments
            .entry((class_id, student_id))
            .or_insert(Enrollment {
                joined_date: at,
                is_active: false,
            });

        if enrollment.is_active {
            return Err(StoreError::Conflict(ALREADY_ENROLLED.to_string()));
        }
        enrollment.is_active = true;
        enrollment.joined_date = at;
        Ok(())
    }

    async fn deactivate_enrollment(&self, class_id: i64, student_id: i64) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        match tables.enrollments.get_mut(&(class_id, student_id)) {
            Some(e) if e.is_active => {
                e.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_class_students(&self, class_id: i64) -> StoreResult<Vec<ClassStudent>> {
        let tables = self.lock()?;
        let mut students: Vec<ClassStudent> = tables
            .enrollments
            .iter()
            .filter(|((c, _), e)| *c == class_id && e.is_active)
            .filter_map(|((_, student_id), e)| {
                let user = tables.users.get(student_id)?;
                let profile = tables.student_profiles.get(student_id);
                Some(ClassStudent {
                    user_id: user.id,
                    email: user.email.clone(),
                    first_name: profile
                        .map_or_else(|| user.first_name.clone(), |p| p.first_name.clone()),
                    last_name: profile
                        .map_or_else(|| user.last_name.clone(), |p| p.last_name.clone()),
                    grade_level: profile.and_then(|p| p.grade_level.clone()),
                    joined_date: e.joined_date,
                })
            })
            .collect();
        students.sort_by(|a, b| {
            (&a.last_name, &a.first_name, a.user_id).cmp(&(&b.last_name, &b.first_name, b.user_id))
        });
        Ok(students)
    }
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn create_assignment(&self, new_assignment: NewAssignment) -> StoreResult<Assignment> {
        let mut tables = self.lock()?;
        let id = tables.next_id();
        let assignment = Assignment {
            id,
            class_id: new_assignment.class_id,
            title: new_assignment.title,
            description: new_assignment.description,
            due_date: new_assignment.due_date,
            points_possible: new_assignment.points_possible,
            is_published: new_assignment.is_published,
            allow_late_submissions: new_assignment.allow_late_submissions,
            created_by: new_assignment.created_by,
            created_at: new_assignment.created_at,
        };
        tables.assignments.insert(id, assignment.clone());
        Ok(assignment)
    }

    async fn find_assignment(&self, class_id: i64, id: i64) -> StoreResult<Option<Assignment>> {
        let tables = self.lock()?;
        Ok(tables
            .assignments
            .get(&id)
            .filter(|a| a.class_id == class_id)
            .cloned())
    }

    async fn list_assignments(
        &self,
        class_id: i64,
        published_only: bool,
    ) -> StoreResult<Vec<Assignment>> {
        let tables = self.lock()?;
        let mut assignments: Vec<Assignment> = tables
            .assignments
            .values()
            .filter(|a| a.class_id == class_id && (a.is_published || !published_only))
            .cloned()
            .collect();
        // Dated first, earliest deadline first.
        assignments.sort_by_key(|a| (a.due_date.is_none(), a.due_date, a.id));
        Ok(assignments)
    }

    async fn update_assignment(
        &self,
        class_id: i64,
        id: i64,
        changes: AssignmentChanges,
    ) -> StoreResult<Option<Assignment>> {
        let mut tables = self.lock()?;
        let Some(assignment) = tables
            .assignments
            .get_mut(&id)
            .filter(|a| a.class_id == class_id)
        else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            assignment.title = title;
        }
        if let Some(description) = changes.description {
            assignment.description = Some(description);
        }
        if let Some(due_date) = changes.due_date {
            assignment.due_date = due_date;
        }
        if let Some(points_possible) = changes.points_possible {
            assignment.points_possible = points_possible;
        }
        if let Some(is_published) = changes.is_published {
            assignment.is_published = is_published;
        }
        if let Some(allow_late_submissions) = changes.allow_late_submissions {
            assignment.allow_late_submissions = allow_late_submissions;
        }
        Ok(Some(assignment.clone()))
    }

    async fn delete_assignment(&self, class_id: i64, id: i64) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        if !tables
            .assignments
            .get(&id)
            .is_some_and(|a| a.class_id == class_id)
        {
            return Ok(false);
        }
        tables.remove_assignment(id);
        Ok(true)
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn find_submission(
        &self,
        assignment_id: i64,
        student_id: i64,
    ) -> StoreResult<Option<Submission>> {
        let tables = self.lock()?;
        Ok(tables
            .submissions
            .values()
            .find(|s| s.assignment_id == assignment_id && s.student_id == student_id)
            .cloned())
    }

    async fn upsert_submission(
        &self,
        submission: NewSubmission,
    ) -> StoreResult<Option<Submission>> {
        let mut tables = self.lock()?;

        if let Some(existing) = tables.submissions.values_mut().find(|s| {
            s.assignment_id == submission.assignment_id && s.student_id == submission.student_id
        }) {
            if existing.status == SubmissionStatus::Graded {
                return Ok(None);
            }
            existing.content = submission.content;
            existing.file_url = submission.file_url;
            existing.submission_date = submission.submission_date;
            existing.is_late = submission.is_late;
            existing.status = SubmissionStatus::Submitted;
            return Ok(Some(existing.clone()));
        }

        let id = tables.next_id();
        let row = Submission {
            id,
            assignment_id: submission.assignment_id,
            student_id: submission.student_id,
            content: submission.content,
            file_url: submission.file_url,
            submission_date: submission.submission_date,
            is_late: submission.is_late,
            status: SubmissionStatus::Submitted,
            grade: None,
            feedback: None,
            graded_by: None,
            graded_date: None,
        };
        tables.submissions.insert(id, row.clone());
        Ok(Some(row))
    }

    async fn save_grade(
        &self,
        submission_id: i64,
        grade: GradeUpdate,
    ) -> StoreResult<Option<Submission>> {
        let mut tables = self.lock()?;
        let Some(submission) = tables.submissions.get_mut(&submission_id) else {
            return Ok(None);
        };
        submission.status = SubmissionStatus::Graded;
        submission.grade = Some(grade.grade);
        submission.feedback = grade.feedback;
        submission.graded_by = Some(grade.graded_by);
        submission.graded_date = Some(grade.graded_date);
        Ok(Some(submission.clone()))
    }

    async fn list_submissions(&self, assignment_id: i64) -> StoreResult<Vec<Submission>> {
        let tables = self.lock()?;
        let mut submissions: Vec<Submission> = tables
            .submissions
            .values()
            .filter(|s| s.assignment_id == assignment_id)
            .cloned()
            .collect();
        submissions.sort_by_key(|s| s.student_id);
        Ok(submissions)
    }

    async fn set_submission_late(&self, submission_id: i64, is_late: bool) -> StoreResult<()> {
        if let Some(submission) = self.lock()?.submissions.get_mut(&submission_id) {
            submission.is_late = is_late;
        }
        Ok(())
    }

    async fn submissions_for_student(
        &self,
        class_id: i64,
        student_id: i64,
    ) -> StoreResult<Vec<Submission>> {
        let tables = self.lock()?;
        Ok(tables
            .submissions
            .values()
            .filter(|s| {
                s.student_id == student_id
                    && tables
                        .assignments
                        .get(&s.assignment_id)
                        .is_some_and(|a| a.class_id == class_id)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AnnouncementStore for MemoryStore {
    async fn create_announcement(
        &self,
        new_announcement: NewAnnouncement,
    ) -> StoreResult<Announcement> {
        let mut tables = self.lock()?;
        let id = tables.next_id();
        let row = AnnouncementRow {
            id,
            class_id: new_announcement.class_id,
            title: new_announcement.title,
            content: new_announcement.content,
            created_by: new_announcement.created_by,
            created_date: new_announcement.created_date,
            scheduled_date: new_announcement.scheduled_date,
            is_published: new_announcement.is_published,
        };
        let announcement = tables.announcement(&row);
        tables.announcements.insert(id, row);
        Ok(announcement)
    }

    async fn list_announcements(&self, class_id: i64) -> StoreResult<Vec<Announcement>> {
        let tables = self.lock()?;
        let mut rows: Vec<&AnnouncementRow> = tables
            .announcements
            .values()
            .filter(|a| a.class_id == class_id)
            .collect();
        rows.sort_by(|a, b| (b.created_date, b.id).cmp(&(a.created_date, a.id)));
        Ok(rows.into_iter().map(|r| tables.announcement(r)).collect())
    }

    async fn find_announcement(
        &self,
        class_id: i64,
        id: i64,
    ) -> StoreResult<Option<Announcement>> {
        let tables = self.lock()?;
        Ok(tables
            .announcements
            .get(&id)
            .filter(|a| a.class_id == class_id)
            .map(|r| tables.announcement(r)))
    }

    async fn update_announcement(
        &self,
        class_id: i64,
        id: i64,
        changes: AnnouncementChanges,
    ) -> StoreResult<Option<Announcement>> {
        let mut tables = self.lock()?;
        let Some(row) = tables
            .announcements
            .get_mut(&id)
            .filter(|a| a.class_id == class_id)
        else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            row.title = title;
        }
        if let Some(content) = changes.content {
            row.content = content;
        }
        if let Some(scheduled_date) = changes.scheduled_date {
            row.scheduled_date = Some(scheduled_date);
        }
        if let Some(is_published) = changes.is_published {
            row.is_published = is_published;
        }
        let row = row.clone();
        Ok(Some(tables.announcement(&row)))
    }

    async fn delete_announcement(&self, class_id: i64, id: i64) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        if !tables
            .announcements
            .get(&id)
            .is_some_and(|a| a.class_id == class_id)
        {
            return Ok(false);
        }
        tables.announcements.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn create_message(&self, message: NewChatMessage) -> StoreResult<ChatMessage> {
        let mut tables = self.lock()?;
        let id = tables.next_id();
        let row = ChatRow {
            id,
            class_id: message.class_id,
            user_id: message.user_id,
            content: message.content,
            timestamp: message.timestamp,
            is_deleted: false,
        };
        let created = tables.chat_message(&row);
        tables.chat_messages.insert(id, row);
        Ok(created)
    }

    async fn list_messages(&self, class_id: i64) -> StoreResult<Vec<ChatMessage>> {
        let tables = self.lock()?;
        let mut rows: Vec<&ChatRow> = tables
            .chat_messages
            .values()
            .filter(|m| m.class_id == class_id && !m.is_deleted)
            .collect();
        rows.sort_by_key(|m| (m.timestamp, m.id));
        Ok(rows.into_iter().map(|r| tables.chat_message(r)).collect())
    }

    async fn find_message(&self, class_id: i64, id: i64) -> StoreResult<Option<ChatMessage>> {
        let tables = self.lock()?;
        Ok(tables
            .chat_messages
            .get(&id)
            .filter(|m| m.class_id == class_id && !m.is_deleted)
            .map(|r| tables.chat_message(r)))
    }

    async fn soft_delete_message(&self, class_id: i64, id: i64) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        match tables.chat_messages.get_mut(&id) {
            Some(m) if m.class_id == class_id && !m.is_deleted => {
                m.is_deleted = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    fn new_user(email: &str, role: UserRole) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "$2b$04$hash".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            role,
            department: None,
            grade_level: Some("10".to_string()),
            registered_at: at(1),
        }
    }

    fn new_submission(assignment_id: i64, student_id: i64, content: &str) -> NewSubmission {
        NewSubmission {
            assignment_id,
            student_id,
            content: Some(content.to_string()),
            file_url: None,
            submission_date: at(5),
            is_late: false,
        }
    }

    #[tokio::test]
    async fn test_create_user_creates_profile_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let user = store
            .create_user(new_user("s@example.com", UserRole::Student))
            .await
            .unwrap();

        let profile = store.find_profile(&user).await.unwrap();
        assert!(matches!(profile, Some(RoleProfile::Student(_))));

        let err = store
            .create_user(new_user("s@example.com", UserRole::Teacher))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_reset_token_lookup_respects_expiry() {
        let store = MemoryStore::new();
        store
            .insert_reset_token(1, "abc", at(2), at(1))
            .await
            .unwrap();

        assert!(
            store
                .find_valid_reset_token("abc", at(2) - Duration::seconds(1))
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .find_valid_reset_token("abc", at(2))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_upsert_overwrites_in_place() {
        let store = MemoryStore::new();
        let first = store
            .upsert_submission(new_submission(1, 2, "draft"))
            .await
            .unwrap()
            .unwrap();
        let second = store
            .upsert_submission(new_submission(1, 2, "final"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(first.id, second.id);
        let all = store.list_submissions(1).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].content.as_deref(), Some("final"));
    }

    #[tokio::test]
    async fn test_upsert_leaves_graded_rows_alone() {
        let store = MemoryStore::new();
        let sub = store
            .upsert_submission(new_submission(1, 2, "answer"))
            .await
            .unwrap()
            .unwrap();
        store
            .save_grade(
                sub.id,
                GradeUpdate {
                    grade: 90,
                    feedback: None,
                    graded_by: 7,
                    graded_date: at(6),
                },
            )
            .await
            .unwrap();

        let result = store
            .upsert_submission(new_submission(1, 2, "changed"))
            .await
            .unwrap();
        assert!(result.is_none());

        let stored = store.find_submission(1, 2).await.unwrap().unwrap();
        assert_eq!(stored.content.as_deref(), Some("answer"));
        assert_eq!(stored.status, SubmissionStatus::Graded);
    }

    #[tokio::test]
    async fn test_enrollment_conflict_and_reactivation() {
        let store = MemoryStore::new();
        store.enroll_student(1, 2, at(1)).await.unwrap();
        assert!(
            store
                .enroll_student(1, 2, at(2))
                .await
                .unwrap_err()
                .is_conflict()
        );

        assert!(store.deactivate_enrollment(1, 2).await.unwrap());
        assert!(!store.is_enrolled(1, 2).await.unwrap());

        store.enroll_student(1, 2, at(3)).await.unwrap();
        assert!(store.is_enrolled(1, 2).await.unwrap());
    }

    #[tokio::test]
    async fn test_deleted_chat_messages_are_hidden() {
        let store = MemoryStore::new();
        let user = store
            .create_user(new_user("s@example.com", UserRole::Student))
            .await
            .unwrap();
        let message = store
            .create_message(NewChatMessage {
                class_id: 1,
                user_id: user.id,
                content: "hi".to_string(),
                timestamp: at(2),
            })
            .await
            .unwrap();
        assert_eq!(message.user_name, "Test User");

        assert!(store.soft_delete_message(1, message.id).await.unwrap());
        assert!(store.list_messages(1).await.unwrap().is_empty());
        assert!(!store.soft_delete_message(1, message.id).await.unwrap());
    }
}
