use anyhow::anyhow;

use classconnect_core::AppError;
use classconnect_db::StoreError;
use classconnect_models::submissions::LifecycleError;

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("You are not enrolled in this class")]
    NotEnrolled,

    #[error("You are not allowed to view or grade this submission")]
    NotAuthorized,

    #[error("Submission not found")]
    SubmissionNotFound,

    #[error("Assignment not found")]
    AssignmentNotFound,

    #[error("Grade must be between 0 and {points_possible}")]
    InvalidGrade { grade: i32, points_possible: i32 },

    #[error("Submission must include content or a file")]
    EmptySubmission,

    #[error("The due date has passed and this assignment does not accept late submissions")]
    LateSubmissionNotAllowed,

    #[error("This submission has already been graded")]
    AlreadyGraded,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<LifecycleError> for SubmissionError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::InvalidGrade {
                grade,
                points_possible,
            } => SubmissionError::InvalidGrade {
                grade,
                points_possible,
            },
            LifecycleError::AlreadyGraded => SubmissionError::AlreadyGraded,
        }
    }
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::NotEnrolled | SubmissionError::NotAuthorized => {
                AppError::forbidden(anyhow!(err.to_string()))
            }
            SubmissionError::SubmissionNotFound | SubmissionError::AssignmentNotFound => {
                AppError::not_found(anyhow!(err.to_string()))
            }
            SubmissionError::InvalidGrade { .. }
            | SubmissionError::EmptySubmission
            | SubmissionError::LateSubmissionNotAllowed => {
                AppError::bad_request(anyhow!(err.to_string()))
            }
            SubmissionError::AlreadyGraded => AppError::conflict(anyhow!(err.to_string())),
            SubmissionError::Store(e) => e.into(),
        }
    }
}
