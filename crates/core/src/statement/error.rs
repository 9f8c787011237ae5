//! Statement error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use freightbook_shared::AppError;
use freightbook_shared::types::{CustomerId, MoneyError, StatementId};

/// Errors that can occur while building or updating statements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementError {
    /// The period starts after it ends.
    #[error("Statement period start {start} is after end {end}")]
    InvalidPeriod {
        /// Period start.
        start: DateTime<Utc>,
        /// Period end.
        end: DateTime<Utc>,
    },

    /// Customer not found in the directory.
    #[error("Customer {0} not found")]
    CustomerNotFound(CustomerId),

    /// Statement not found (or deleted).
    #[error("Statement {0} not found")]
    StatementNotFound(StatementId),

    /// No recipient given and the customer has no e-mail address.
    #[error("No recipient given and customer has no e-mail address")]
    MissingRecipient,

    /// The recipient is not an e-mail address.
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    /// Amounts could not be expressed in the statement currency.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl From<StatementError> for AppError {
    fn from(err: StatementError) -> Self {
        let message = err.to_string();
        match err {
            StatementError::InvalidPeriod { .. }
            | StatementError::MissingRecipient
            | StatementError::InvalidRecipient(_)
            | StatementError::Money(_) => Self::Validation(message),
            StatementError::CustomerNotFound(_) | StatementError::StatementNotFound(_) => {
                Self::NotFound(message)
            }
        }
    }
}
