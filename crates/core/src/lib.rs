//! Core receivables logic for Freightbook.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, state machines and calculations live here; the `db` crate
//! loads records, calls into these services inside one transaction, and persists
//! the result.
//!
//! # Modules
//!
//! - `tracking` - Expected incoming-invoice tracking lifecycle
//! - `dunning` - Overdue escalation levels, fees and service suspension
//! - `statement` - Statement of accounts reconstruction
//! - `aging` - Receivables aging buckets across customers
//! - `audit` - Typed audit events emitted by every mutation
//! - `batch` - Per-item outcome accumulator for batch operations

pub mod aging;
pub mod audit;
pub mod batch;
pub mod dunning;
pub mod statement;
pub mod tracking;
