use anyhow::anyhow;

use classconnect_core::AppError;
use classconnect_db::StoreError;

use crate::modules::classes::error::ClassError;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Message not found")]
    MessageNotFound,

    #[error("Only the author or a teacher of this class can delete this message")]
    CannotDelete,

    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error(transparent)]
    Class(#[from] ClassError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::MessageNotFound => AppError::not_found(anyhow!(err.to_string())),
            ChatError::CannotDelete => AppError::forbidden(anyhow!(err.to_string())),
            ChatError::EmptyMessage => AppError::bad_request(anyhow!(err.to_string())),
            ChatError::Class(e) => e.into(),
            ChatError::Store(e) => e.into(),
        }
    }
}
