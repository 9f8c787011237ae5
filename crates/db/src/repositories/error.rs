//! Repository error type shared by every receivables repository.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use freightbook_core::dunning::DunningError;
use freightbook_core::statement::StatementError;
use freightbook_core::tracking::TrackingError;
use freightbook_shared::AppError;

/// Errors returned by the receivables repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Tracking rule violation.
    #[error(transparent)]
    Tracking(#[from] TrackingError),

    /// Dunning rule violation.
    #[error(transparent)]
    Dunning(#[from] DunningError),

    /// Statement rule violation.
    #[error(transparent)]
    Statement(#[from] StatementError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// JSON column could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row does not map onto the domain model.
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl RepositoryError {
    /// Builds a `Corrupt` error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }

    /// True if the database rejected a duplicate key.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::Database(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        )
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Tracking(e) => e.into(),
            RepositoryError::Dunning(e) => e.into(),
            RepositoryError::Statement(e) => e.into(),
            e @ RepositoryError::Database(_) if e.is_unique_violation() => {
                Self::Conflict(e.to_string())
            }
            RepositoryError::Database(e) => Self::Database(e.to_string()),
            RepositoryError::Serialization(e) => Self::Internal(e.to_string()),
            RepositoryError::Corrupt(msg) => Self::Internal(msg),
        }
    }
}
