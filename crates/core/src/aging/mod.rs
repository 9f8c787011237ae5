//! Receivables aging.
//!
//! Aggregates the latest statement of every customer into day-range buckets:
//! current (up to 30 days), 31-60, 61-90 and 90+.

pub mod service;
pub mod types;


pub use service::AgingService;
pub use types::{AgingBucket, AgingBuckets, AgingReport, AgingTotals, CustomerAging};
