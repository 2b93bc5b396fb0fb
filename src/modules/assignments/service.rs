use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use classconnect_auth::AuthContext;
use classconnect_db::Store;
use classconnect_models::assignments::{
    Assignment, AssignmentChanges, AssignmentResponse, CreateAssignmentRequest,
    DEFAULT_POINTS_POSSIBLE, NewAssignment,
};
use classconnect_models::submissions::{Submission, SubmissionStatus};

use super::error::AssignmentError;
use crate::modules::classes::access::{Membership, class_membership, require_class_teacher};
use crate::modules::submissions::service::SubmissionService;

pub struct AssignmentService;

impl AssignmentService {
    #[instrument(skip(db, dto), fields(title = %dto.title))]
    pub async fn create_assignment(
        db: &dyn Store,
        class_id: i64,
        teacher_id: i64,
        dto: CreateAssignmentRequest,
        now: DateTime<Utc>,
    ) -> Result<Assignment, AssignmentError> {
        require_class_teacher(db, class_id, teacher_id).await?;

        let assignment = db
            .create_assignment(NewAssignment {
                class_id,
                title: dto.title.trim().to_string(),
                description: dto.description,
                due_date: dto.due_date,
                points_possible: dto.points_possible.unwrap_or(DEFAULT_POINTS_POSSIBLE),
                is_published: dto.is_published.unwrap_or(true),
                allow_late_submissions: dto.allow_late_submissions.unwrap_or(true),
                created_by: teacher_id,
                created_at: now,
            })
            .await?;

        info!(assignment_id = assignment.id, "Assignment created");
        Ok(assignment)
    }

    /// Teachers see every assignment. Students see published ones only,
    /// each with their own status and grade.
    #[instrument(skip(db))]
    pub async fn list_assignments(
        db: &dyn Store,
        class_id: i64,
        ctx: &AuthContext,
    ) -> Result<Vec<AssignmentResponse>, AssignmentError> {
        let (_, membership) = class_membership(db, class_id, ctx).await?;

        match membership {
            Membership::Teacher => Ok(db
                .list_assignments(class_id, false)
                .await?
                .into_iter()
                .map(AssignmentResponse::from)
                .collect()),
            Membership::Student => {
                let assignments = db.list_assignments(class_id, true).await?;
                let mut mine: HashMap<i64, Submission> = db
                    .submissions_for_student(class_id, ctx.user_id)
                    .await?
                    .into_iter()
                    .map(|s| (s.assignment_id, s))
                    .collect();

                Ok(assignments
                    .into_iter()
                    .map(|a| {
                        let submission = mine.remove(&a.id);
                        with_student_state(a, submission.as_ref())
                    })
                    .collect())
            }
        }
    }

    #[instrument(skip(db))]
    pub async fn get_assignment(
        db: &dyn Store,
        class_id: i64,
        assignment_id: i64,
        ctx: &AuthContext,
    ) -> Result<AssignmentResponse, AssignmentError> {
        let (_, membership) = class_membership(db, class_id, ctx).await?;

        let assignment = db
            .find_assignment(class_id, assignment_id)
            .await?
            .ok_or(AssignmentError::AssignmentNotFound)?;

        match membership {
            Membership::Teacher => Ok(assignment.into()),
            Membership::Student if !assignment.is_published => {
                Err(AssignmentError::AssignmentNotFound)
            }
            Membership::Student => {
                let submission = db.find_submission(assignment_id, ctx.user_id).await?;
                Ok(with_student_state(assignment, submission.as_ref()))
            }
        }
    }

    /// Partial update. Moving the deadline re-evaluates every submission's
    /// late flag; a failed reconciliation is logged and does not fail the
    /// update. Lowering `points_possible` below a recorded grade is rejected.
    #[instrument(skip(db, changes))]
    pub async fn update_assignment(
        db: &dyn Store,
        class_id: i64,
        assignment_id: i64,
        teacher_id: i64,
        changes: AssignmentChanges,
    ) -> Result<Assignment, AssignmentError> {
        require_class_teacher(db, class_id, teacher_id).await?;

        let current = db
            .find_assignment(class_id, assignment_id)
            .await?
            .ok_or(AssignmentError::AssignmentNotFound)?;
        let due_date_change = changes.due_date_change(&current);

        if let Some(points_possible) = changes.points_possible {
            let highest_grade = db
                .list_submissions(assignment_id)
                .await?
                .iter()
                .filter_map(|s| s.grade)
                .max()
                .unwrap_or(0);
            if highest_grade > points_possible {
                return Err(AssignmentError::PointsBelowExistingGrade { highest_grade });
            }
        }

        let updated = db
            .update_assignment(class_id, assignment_id, changes)
            .await?
            .ok_or(AssignmentError::AssignmentNotFound)?;

        if let Some(due_date) = due_date_change {
            if let Err(e) =
                SubmissionService::on_due_date_changed(db, assignment_id, due_date).await
            {
                warn!(assignment_id, error = %e, "Failed to reconcile late flags after due date change");
            }
        }

        Ok(updated)
    }

    #[instrument(skip(db))]
    pub async fn delete_assignment(
        db: &dyn Store,
        class_id: i64,
        assignment_id: i64,
        teacher_id: i64,
    ) -> Result<(), AssignmentError> {
        require_class_teacher(db, class_id, teacher_id).await?;

        if !db.delete_assignment(class_id, assignment_id).await? {
            return Err(AssignmentError::AssignmentNotFound);
        }
        info!(assignment_id, "Assignment deleted");
        Ok(())
    }
}

fn with_student_state(
    assignment: Assignment,
    submission: Option<&Submission>,
) -> AssignmentResponse {
    AssignmentResponse {
        assignment,
        status: Some(submission.map_or(SubmissionStatus::NotSubmitted, |s| s.status)),
        grade: submission.and_then(|s| s.grade),
    }
}
