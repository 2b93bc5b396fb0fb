use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use classconnect_auth::AuthContext;
use classconnect_db::{Store, StoreError};
use classconnect_models::assignments::Assignment;
use classconnect_models::submissions::{
    GradeRequest, GradeUpdate, NewSubmission, SubmissionView, SubmitRequest, is_late,
    placeholder_student_name, roster_view,
};

use super::error::SubmissionError;

pub struct SubmissionService;

impl SubmissionService {
    /// Creates the student's submission, or overwrites the existing one in
    /// place. Graded work cannot be resubmitted.
    #[instrument(skip(db, dto))]
    pub async fn submit(
        db: &dyn Store,
        class_id: i64,
        assignment_id: i64,
        student_id: i64,
        dto: SubmitRequest,
        now: DateTime<Utc>,
    ) -> Result<SubmissionView, SubmissionError> {
        let assignment = Self::visible_assignment(db, class_id, assignment_id).await?;

        if !db.is_enrolled(class_id, student_id).await? {
            return Err(SubmissionError::NotEnrolled);
        }

        let (content, file_url) = dto.into_parts();
        if content.is_none() && file_url.is_none() {
            return Err(SubmissionError::EmptySubmission);
        }

        let late = is_late(now, assignment.due_date);
        if late && !assignment.allow_late_submissions {
            return Err(SubmissionError::LateSubmissionNotAllowed);
        }

        if let Some(existing) = db.find_submission(assignment_id, student_id).await? {
            existing.ensure_resubmittable()?;
        }

        let submission = db
            .upsert_submission(NewSubmission {
                assignment_id,
                student_id,
                content,
                file_url,
                submission_date: now,
                is_late: late,
            })
            .await?
            // Graded between the check above and the write.
            .ok_or(SubmissionError::AlreadyGraded)?;

        info!(submission_id = submission.id, is_late = late, "Submission saved");

        let name = Self::student_name(db, student_id).await;
        Ok(SubmissionView::from_submission(submission, name))
    }

    #[instrument(skip(db, dto), fields(grade = dto.grade))]
    pub async fn grade(
        db: &dyn Store,
        class_id: i64,
        assignment_id: i64,
        student_id: i64,
        teacher_id: i64,
        dto: GradeRequest,
        now: DateTime<Utc>,
    ) -> Result<SubmissionView, SubmissionError> {
        let assignment = db
            .find_assignment(class_id, assignment_id)
            .await?
            .ok_or(SubmissionError::AssignmentNotFound)?;

        if !db.is_class_teacher(class_id, teacher_id).await? {
            return Err(SubmissionError::NotAuthorized);
        }

        let mut submission = db
            .find_submission(assignment_id, student_id)
            .await?
            .ok_or(SubmissionError::SubmissionNotFound)?;

        submission.apply_grade(
            dto.grade,
            dto.feedback,
            teacher_id,
            assignment.points_possible,
            now,
        )?;

        let saved = db
            .save_grade(
                submission.id,
                GradeUpdate {
                    grade: dto.grade,
                    feedback: submission.feedback.clone(),
                    graded_by: teacher_id,
                    graded_date: now,
                },
            )
            .await?
            .ok_or(SubmissionError::SubmissionNotFound)?;

        info!(submission_id = saved.id, "Submission graded");

        let name = Self::student_name(db, student_id).await;
        Ok(SubmissionView::from_submission(saved, name))
    }

    /// The student's own view. Absence of a row is `NotSubmitted`, not an error.
    #[instrument(skip(db))]
    pub async fn my_submission(
        db: &dyn Store,
        class_id: i64,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<SubmissionView, SubmissionError> {
        Self::visible_assignment(db, class_id, assignment_id).await?;

        if !db.is_enrolled(class_id, student_id).await? {
            return Err(SubmissionError::NotEnrolled);
        }

        Self::view_for(db, assignment_id, student_id).await
    }

    /// A single student's submission, readable by a teacher of the class or
    /// by that student.
    #[instrument(skip(db))]
    pub async fn student_submission(
        db: &dyn Store,
        class_id: i64,
        assignment_id: i64,
        student_id: i64,
        ctx: &AuthContext,
    ) -> Result<SubmissionView, SubmissionError> {
        db.find_assignment(class_id, assignment_id)
            .await?
            .ok_or(SubmissionError::AssignmentNotFound)?;

        let allowed = if ctx.is_teacher() {
            db.is_class_teacher(class_id, ctx.user_id).await?
        } else {
            ctx.user_id == student_id && db.is_enrolled(class_id, student_id).await?
        };
        if !allowed {
            return Err(SubmissionError::NotAuthorized);
        }

        Self::view_for(db, assignment_id, student_id).await
    }

    /// Every enrolled student with their submission state, for the teacher.
    #[instrument(skip(db))]
    pub async fn roster(
        db: &dyn Store,
        class_id: i64,
        assignment_id: i64,
        teacher_id: i64,
    ) -> Result<Vec<SubmissionView>, SubmissionError> {
        db.find_assignment(class_id, assignment_id)
            .await?
            .ok_or(SubmissionError::AssignmentNotFound)?;

        if !db.is_class_teacher(class_id, teacher_id).await? {
            return Err(SubmissionError::NotAuthorized);
        }

        let submissions = db.list_submissions(assignment_id).await?;
        let students = db.list_class_students(class_id).await?;

        Ok(roster_view(assignment_id, submissions, &students))
    }

    /// Recomputes `is_late` for every submission under the assignment and
    /// writes back only the rows whose flag flipped. Returns how many did.
    #[instrument(skip(db))]
    pub async fn on_due_date_changed(
        db: &dyn Store,
        assignment_id: i64,
        new_due_date: Option<DateTime<Utc>>,
    ) -> Result<usize, StoreError> {
        let mut changed = 0;
        for mut submission in db.list_submissions(assignment_id).await? {
            if submission.reconcile_late(new_due_date) {
                db.set_submission_late(submission.id, submission.is_late)
                    .await?;
                changed += 1;
            }
        }

        if changed > 0 {
            info!(changed, "Late flags reconciled after due date change");
        }
        Ok(changed)
    }

    async fn view_for(
        db: &dyn Store,
        assignment_id: i64,
        student_id: i64,
    ) -> Result<SubmissionView, SubmissionError> {
        let name = Self::student_name(db, student_id).await;
        Ok(match db.find_submission(assignment_id, student_id).await? {
            Some(submission) => SubmissionView::from_submission(submission, name),
            None => SubmissionView::not_submitted(assignment_id, student_id, name),
        })
    }

    /// Students never see unpublished work.
    async fn visible_assignment(
        db: &dyn Store,
        class_id: i64,
        assignment_id: i64,
    ) -> Result<Assignment, SubmissionError> {
        db.find_assignment(class_id, assignment_id)
            .await?
            .filter(|a| a.is_published)
            .ok_or(SubmissionError::AssignmentNotFound)
    }

    async fn student_name(db: &dyn Store, student_id: i64) -> String {
        match db.find_user_by_id(student_id).await {
            Ok(Some(user)) => user.full_name(),
            Ok(None) => placeholder_student_name(student_id),
            Err(e) => {
                warn!(student_id, error = %e, "Failed to load student name");
                placeholder_student_name(student_id)
            }
        }
    }
}
