use anyhow::anyhow;

use classconnect_core::AppError;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness rule was violated. Carries a client-safe description.
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Maps a Postgres unique violation to [`StoreError::Conflict`].
pub(crate) fn map_unique(err: sqlx::Error, conflict: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(conflict.to_string())
        }
        _ => StoreError::Database(err),
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => AppError::conflict(anyhow!(message)),
            other => AppError::internal(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_maps_to_409() {
        let err: AppError = StoreError::Conflict("Email already registered".into()).into();
        assert_eq!(err.status.as_u16(), 409);
        assert_eq!(err.public_message(), "Email already registered");
    }

    #[test]
    fn test_unavailable_maps_to_500() {
        let err: AppError = StoreError::Unavailable("lock poisoned".into()).into();
        assert_eq!(err.status.as_u16(), 500);
        assert_eq!(err.public_message(), "Internal server error");
    }
}
