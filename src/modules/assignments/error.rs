use anyhow::anyhow;

use classconnect_core::AppError;
use classconnect_db::StoreError;

use crate::modules::classes::error::ClassError;

#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("Assignment not found")]
    AssignmentNotFound,

    #[error("Points possible cannot drop below an existing grade of {highest_grade}")]
    PointsBelowExistingGrade { highest_grade: i32 },

    #[error(transparent)]
    Class(#[from] ClassError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AssignmentError> for AppError {
    fn from(err: AssignmentError) -> Self {
        match err {
            AssignmentError::AssignmentNotFound => AppError::not_found(anyhow!(err.to_string())),
            AssignmentError::PointsBelowExistingGrade { .. } => {
                AppError::bad_request(anyhow!(err.to_string()))
            }
            AssignmentError::Class(e) => e.into(),
            AssignmentError::Store(e) => e.into(),
        }
    }
}
