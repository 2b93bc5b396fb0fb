use anyhow::anyhow;

use classconnect_core::AppError;
use classconnect_db::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ClassError {
    #[error("Class not found")]
    ClassNotFound,

    #[error("You are not a member of this class")]
    NotAMember,

    #[error("Only a teacher of this class can do that")]
    NotClassTeacher,

    #[error("Invalid class code")]
    InvalidClassCode,

    #[error("You are already enrolled in this class")]
    AlreadyEnrolled,

    #[error("Student is not enrolled in this class")]
    StudentNotEnrolled,

    #[error("Could not generate a unique class code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ClassError> for AppError {
    fn from(err: ClassError) -> Self {
        match err {
            ClassError::ClassNotFound
            | ClassError::InvalidClassCode
            | ClassError::StudentNotEnrolled => AppError::not_found(anyhow!(err.to_string())),
            ClassError::NotAMember | ClassError::NotClassTeacher => {
                AppError::forbidden(anyhow!(err.to_string()))
            }
            ClassError::AlreadyEnrolled => AppError::conflict(anyhow!(err.to_string())),
            ClassError::CodeSpaceExhausted { .. } => AppError::internal(err),
            ClassError::Store(e) => e.into(),
        }
    }
}
