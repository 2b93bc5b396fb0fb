//! Submission state and its transitions.
//!
//! A (assignment, student) pair moves `not_submitted -> submitted -> graded`.
//! Resubmission overwrites a `submitted` row in place; nothing leaves
//! `graded`. `not_submitted` is never stored: it is the absence of a row,
//! surfaced as [`SubmissionView::NotSubmitted`].

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::classes::ClassStudent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "submission_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    NotSubmitted,
    Submitted,
    Graded,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("Grade {grade} is out of range (0 to {points_possible})")]
    InvalidGrade { grade: i32, points_possible: i32 },

    #[error("Submission has already been graded")]
    AlreadyGraded,
}

/// A submission is late when it lands strictly after the deadline.
/// Without a deadline nothing is late.
pub fn is_late(submitted_at: DateTime<Utc>, due_date: Option<DateTime<Utc>>) -> bool {
    due_date.is_some_and(|due| submitted_at > due)
}

pub fn validate_grade(grade: i32, points_possible: i32) -> Result<(), LifecycleError> {
    if (0..=points_possible).contains(&grade) {
        Ok(())
    } else {
        Err(LifecycleError::InvalidGrade {
            grade,
            points_possible,
        })
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Submission {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub content: Option<String>,
    pub file_url: Option<String>,
    pub submission_date: DateTime<Utc>,
    pub is_late: bool,
    pub status: SubmissionStatus,
    pub grade: Option<i32>,
    pub feedback: Option<String>,
    pub graded_by: Option<i64>,
    pub graded_date: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn ensure_resubmittable(&self) -> Result<(), LifecycleError> {
        match self.status {
            SubmissionStatus::Graded => Err(LifecycleError::AlreadyGraded),
            _ => Ok(()),
        }
    }

    /// Moves the submission to `graded`. Re-grading an already graded
    /// submission replaces the previous grade.
    pub fn apply_grade(
        &mut self,
        grade: i32,
        feedback: Option<String>,
        grader_id: i64,
        points_possible: i32,
        now: DateTime<Utc>,
    ) -> Result<(), LifecycleError> {
        validate_grade(grade, points_possible)?;
        self.status = SubmissionStatus::Graded;
        self.grade = Some(grade);
        self.feedback = feedback;
        self.graded_by = Some(grader_id);
        self.graded_date = Some(now);
        Ok(())
    }

    /// Recomputes `is_late` against a new deadline. Returns whether it changed.
    pub fn reconcile_late(&mut self, due_date: Option<DateTime<Utc>>) -> bool {
        let late = is_late(self.submission_date, due_date);
        let changed = late != self.is_late;
        self.is_late = late;
        changed
    }
}

/// Input for a (re)submission. The store inserts or overwrites in place.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub assignment_id: i64,
    pub student_id: i64,
    pub content: Option<String>,
    pub file_url: Option<String>,
    pub submission_date: DateTime<Utc>,
    pub is_late: bool,
}

/// Grade to persist on an existing submission.
#[derive(Debug, Clone)]
pub struct GradeUpdate {
    pub grade: i32,
    pub feedback: Option<String>,
    pub graded_by: i64,
    pub graded_date: DateTime<Utc>,
}

/// A real submission as shown to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: i64,
    pub assignment_id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub content: Option<String>,
    pub file_url: Option<String>,
    pub submission_date: DateTime<Utc>,
    pub is_late: bool,
    pub grade: Option<i32>,
    pub feedback: Option<String>,
    pub graded_by: Option<i64>,
    pub graded_date: Option<DateTime<Utc>>,
}

/// What a student has (or has not) turned in for an assignment.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionView {
    NotSubmitted {
        #[serde(rename = "assignmentId")]
        assignment_id: i64,
        #[serde(rename = "studentId")]
        student_id: i64,
        #[serde(rename = "studentName")]
        student_name: String,
    },
    Submitted(SubmissionRecord),
    Graded(SubmissionRecord),
}

impl SubmissionView {
    pub fn not_submitted(assignment_id: i64, student_id: i64, student_name: String) -> Self {
        Self::NotSubmitted {
            assignment_id,
            student_id,
            student_name,
        }
    }

    pub fn from_submission(submission: Submission, student_name: String) -> Self {
        let status = submission.status;
        let record = SubmissionRecord {
            id: submission.id,
            assignment_id: submission.assignment_id,
            student_id: submission.student_id,
            student_name,
            content: submission.content,
            file_url: submission.file_url,
            submission_date: submission.submission_date,
            is_late: submission.is_late,
            grade: submission.grade,
            feedback: submission.feedback,
            graded_by: submission.graded_by,
            graded_date: submission.graded_date,
        };
        match status {
            SubmissionStatus::Graded => Self::Graded(record),
            _ => Self::Submitted(record),
        }
    }

    pub fn status(&self) -> SubmissionStatus {
        match self {
            Self::NotSubmitted { .. } => SubmissionStatus::NotSubmitted,
            Self::Submitted(_) => SubmissionStatus::Submitted,
            Self::Graded(_) => SubmissionStatus::Graded,
        }
    }

    pub fn student_id(&self) -> i64 {
        match self {
            Self::NotSubmitted { student_id, .. } => *student_id,
            Self::Submitted(record) | Self::Graded(record) => record.student_id,
        }
    }
}

/// Display name for a student who is no longer on the roster.
pub fn placeholder_student_name(student_id: i64) -> String {
    format!("Student #{student_id}")
}

/// One entry per enrolled student, in roster order, with a `NotSubmitted`
/// entry for anyone without a real submission. Submissions from students
/// who have since left the class are appended after the roster.
pub fn roster_view(
    assignment_id: i64,
    submissions: Vec<Submission>,
    roster: &[ClassStudent],
) -> Vec<SubmissionView> {
    let mut by_student: HashMap<i64, Submission> = submissions
        .into_iter()
        .map(|s| (s.student_id, s))
        .collect();

    let mut views = Vec::with_capacity(roster.len() + by_student.len());
    let mut seen = HashSet::with_capacity(roster.len());

    for student in roster {
        if !seen.insert(student.user_id) {
            continue;
        }
        let view = match by_student.remove(&student.user_id) {
            Some(submission) => SubmissionView::from_submission(submission, student.full_name()),
            None => {
                SubmissionView::not_submitted(assignment_id, student.user_id, student.full_name())
            }
        };
        views.push(view);
    }

    let mut leftovers: Vec<Submission> = by_student.into_values().collect();
    leftovers.sort_by_key(|s| s.student_id);
    views.extend(leftovers.into_iter().map(|s| {
        let name = placeholder_student_name(s.student_id);
        SubmissionView::from_submission(s, name)
    }));

    views
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[validate(length(max = 50000))]
    pub content: Option<String>,
    #[serde(alias = "fileURL")]
    #[validate(length(max = 2048))]
    pub file_url: Option<String>,
}

impl SubmitRequest {
    /// Trimmed content and file reference, with blanks treated as absent.
    pub fn into_parts(self) -> (Option<String>, Option<String>) {
        fn non_blank(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }
        (non_blank(self.content), non_blank(self.file_url))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GradeRequest {
    pub grade: i32,
    #[validate(length(max = 5000))]
    pub feedback: Option<String>,
}
