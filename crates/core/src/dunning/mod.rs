//! Dunning escalation for overdue trackings and invoices.
//!
//! # Modules
//!
//! - `types` - Levels, policies, per-party configuration and per-debt state
//! - `error` - Dunning-specific error types
//! - `service` - Evaluation and application of escalation decisions

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::DunningError;
pub use service::{AppliedDunning, DunningEngine};
pub use types::{
    DebtRef, DebtSnapshot, DunningConfig, DunningDecision, DunningLevel, DunningPolicy,
    DunningState, LevelPolicy, Party, Severity,
};
