/// Store error types
///
/// Every [`TaskStore`](crate::store::TaskStore) and
/// [`UserStore`](crate::store::UserStore) operation, and the
/// [`TaskService`](crate::service::TaskService) built on top of them, reports
/// failures through [`StoreError`].

use validator::ValidationErrors;

/// Result alias for store and service operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for store and service operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The targeted record does not exist (or is not visible to the caller)
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Input failed field validation (e.g. empty or oversized title)
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// A uniqueness constraint was violated (e.g. duplicate username)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("Record"),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                StoreError::Conflict(constraint)
            }
            // Only tasks.owner_id references another table
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                StoreError::NotFound("User")
            }
            other => StoreError::Database(other),
        }
    }
}

impl StoreError {
    /// Whether this error means the record is missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
