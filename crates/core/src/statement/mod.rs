//! Statements of accounts.
//!
//! A statement reconstructs one customer's ledger for a period: opening
//! balance, ordered invoice and payment lines with running balances, closing
//! balance and the invoices still outstanding at period end.
//!
//! # Modules
//!
//! - `types` - Invoice view, statement snapshot and line types
//! - `error` - Statement-specific error types
//! - `service` - Reconstruction, export and send bookkeeping

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::StatementError;
pub use service::StatementService;
pub use types::{
    ExportFormat, InvoiceRecord, InvoiceStatus, OutstandingInvoice, RegenerationRequest,
    StatementOfAccounts, StatementPeriod, StatementSummary, StatementTransaction, TransactionKind,
};
