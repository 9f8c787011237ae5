//! Expected incoming-invoice tracking.
//!
//! One tracking row per delivered shipment follows the partner invoice from
//! expectation through receipt, approval and payment.
//!
//! # Modules
//!
//! - `types` - Tracking domain types (TrackingStatus, IncomingInvoiceTracking)
//! - `error` - Tracking-specific error types
//! - `service` - State transition logic
//! - `bulk` - Bulk creation planning for delivered shipments
//! - `queries` - Missing-invoice, approval history and statistics projections

pub mod bulk;
pub mod error;
pub mod queries;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod tests;

pub use bulk::{
    BulkDecision, BulkPolicy, MAX_DAYS_AFTER_DELIVERY, ShipmentCandidate, SkipReason,
};
pub use error::TrackingError;
pub use queries::{ApprovalRecord, ApprovalStats, CurrencyTotal, MissingInvoice, TrackingFilter};
pub use service::TrackingService;
pub use types::{IncomingInvoiceTracking, InvoiceReceipt, NewTracking, TrackingStatus};
