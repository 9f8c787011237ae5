//! Tracking error types.

use thiserror::Error;

use freightbook_shared::AppError;
use freightbook_shared::types::{InvoiceId, MoneyError, PartnerId, ShipmentId, TrackingId};

use crate::tracking::types::TrackingStatus;

/// Errors that can occur while advancing a tracking row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    /// The requested transition is not allowed from the current status.
    #[error("Invalid tracking transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: TrackingStatus,
        /// The attempted target status.
        to: TrackingStatus,
    },

    /// The operation is not allowed in the current status.
    #[error("Cannot {action} a tracking in status {status}")]
    NotAllowed {
        /// The attempted operation.
        action: &'static str,
        /// The current status.
        status: TrackingStatus,
    },

    /// A dispute can only resolve to `received` or `cancelled`.
    #[error("A dispute cannot be resolved to {0}")]
    InvalidResolution(TrackingStatus),

    /// A required text field was empty.
    #[error("{0} is required")]
    RequiredField(&'static str),

    /// Expected amount must not be negative.
    #[error("Expected amount must not be negative")]
    NegativeAmount,

    /// Bulk window outside `0..=MAX_DAYS_AFTER_DELIVERY`.
    #[error("daysAfterDelivery must be between 0 and {max}, got {days}")]
    InvalidBulkWindow {
        /// Requested window.
        days: i64,
        /// Largest accepted window.
        max: i64,
    },

    /// A tracking row already exists for the shipment.
    #[error("Shipment {0} already has an invoice tracking")]
    AlreadyTracked(ShipmentId),

    /// Tracking not found.
    #[error("Tracking {0} not found")]
    TrackingNotFound(TrackingId),

    /// Shipment not found.
    #[error("Shipment {0} not found")]
    ShipmentNotFound(ShipmentId),

    /// Partner not found.
    #[error("Partner {0} not found")]
    PartnerNotFound(PartnerId),

    /// Invoice not found.
    #[error("Invoice {0} not found")]
    InvoiceNotFound(InvoiceId),

    /// Money arithmetic failed.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

impl From<TrackingError> for AppError {
    fn from(err: TrackingError) -> Self {
        let message = err.to_string();
        match err {
            TrackingError::InvalidTransition { .. } | TrackingError::NotAllowed { .. } => {
                Self::InvalidState(message)
            }
            TrackingError::InvalidResolution(_)
            | TrackingError::RequiredField(_)
            | TrackingError::NegativeAmount
            | TrackingError::InvalidBulkWindow { .. }
            | TrackingError::Money(_) => Self::Validation(message),
            TrackingError::AlreadyTracked(_) => Self::Conflict(message),
            TrackingError::TrackingNotFound(_)
            | TrackingError::ShipmentNotFound(_)
            | TrackingError::PartnerNotFound(_)
            | TrackingError::InvoiceNotFound(_) => Self::NotFound(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_mapping() {
        let invalid: AppError = TrackingError::InvalidTransition {
            from: TrackingStatus::Received,
            to: TrackingStatus::Received,
        }
        .into();
        assert_eq!(invalid.error_code(), "INVALID_STATE");

        let conflict: AppError = TrackingError::AlreadyTracked(ShipmentId::new()).into();
        assert_eq!(conflict.error_code(), "CONFLICT");

        let missing: AppError = TrackingError::TrackingNotFound(TrackingId::new()).into();
        assert_eq!(missing.error_code(), "NOT_FOUND");

        let validation: AppError = TrackingError::RequiredField("Dispute reason").into();
        assert_eq!(validation.error_code(), "VALIDATION_ERROR");
        assert_eq!(validation.to_string(), "Validation error: Dispute reason is required");
    }
}
