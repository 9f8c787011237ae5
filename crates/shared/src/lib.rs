//! Shared types, errors, and configuration for Freightbook.
//!
//! This crate provides common types used across all other crates:
//! - Currency amounts with decimal precision
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - An injectable clock

pub mod clock;
pub mod config;
pub mod error;
pub mod types;

pub use clock::{Clock, FixedClock, SharedClock, SystemClock};
pub use config::{AppConfig, DunningDefaults, LedgerConfig};
pub use error::{AppError, AppResult};
