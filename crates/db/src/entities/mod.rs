//! `SeaORM` entity definitions.
//!
//! Status and kind columns are plain strings; conversion to the core enums
//! happens in `crate::convert`.

pub mod audit_log;
pub mod customers;
pub mod dunning_configs;
pub mod dunning_states;
pub mod incoming_invoice_trackings;
pub mod invoices;
pub mod partners;
pub mod shipments;
pub mod statements_of_accounts;
