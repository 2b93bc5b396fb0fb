use anyhow::anyhow;

use classconnect_core::AppError;
use classconnect_db::StoreError;

use crate::modules::classes::error::ClassError;

#[derive(Debug, thiserror::Error)]
pub enum AnnouncementError {
    #[error("Announcement not found")]
    AnnouncementNotFound,

    #[error("Only the author can change this announcement")]
    NotAuthor,

    #[error(transparent)]
    Class(#[from] ClassError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AnnouncementError> for AppError {
    fn from(err: AnnouncementError) -> Self {
        match err {
            AnnouncementError::AnnouncementNotFound => {
                AppError::not_found(anyhow!(err.to_string()))
            }
            AnnouncementError::NotAuthor => AppError::forbidden(anyhow!(err.to_string())),
            AnnouncementError::Class(e) => e.into(),
            AnnouncementError::Store(e) => e.into(),
        }
    }
}
