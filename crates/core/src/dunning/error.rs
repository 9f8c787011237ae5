//! Dunning error types.

use rust_decimal::Decimal;
use thiserror::Error;

use freightbook_shared::AppError;
use freightbook_shared::types::{InvoiceId, MoneyError, TrackingId};

use crate::dunning::types::{DunningLevel, Party};

/// Errors that can occur during dunning evaluation or configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DunningError {
    /// Level thresholds must be positive and strictly increasing.
    #[error(
        "Dunning thresholds must be positive and strictly increasing (got {level1}, {level2}, {level3})"
    )]
    InvalidThresholds {
        /// Level 1 threshold.
        level1: i64,
        /// Level 2 threshold.
        level2: i64,
        /// Level 3 threshold.
        level3: i64,
    },

    /// Fees must not be negative.
    #[error("Fee for level {level} must not be negative (got {fee})")]
    NegativeFee {
        /// Offending level.
        level: DunningLevel,
        /// Offending fee.
        fee: Decimal,
    },

    /// Tracking not found.
    #[error("Tracking {0} not found")]
    TrackingNotFound(TrackingId),

    /// Invoice not found.
    #[error("Invoice {0} not found")]
    InvoiceNotFound(InvoiceId),

    /// Party not found in the directory.
    #[error("Party {0} not found")]
    PartyNotFound(Party),

    /// Money arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl From<DunningError> for AppError {
    fn from(err: DunningError) -> Self {
        let message = err.to_string();
        match err {
            DunningError::InvalidThresholds { .. }
            | DunningError::NegativeFee { .. }
            | DunningError::Money(_) => Self::Validation(message),
            DunningError::TrackingNotFound(_)
            | DunningError::InvoiceNotFound(_)
            | DunningError::PartyNotFound(_) => Self::NotFound(message),
        }
    }
}
