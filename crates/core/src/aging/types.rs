//! Aging report types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use freightbook_shared::types::{Currency, CustomerId, StatementId};

/// Day-range bucket of an outstanding invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingBucket {
    /// Up to 30 days overdue.
    Current,
    /// 31 to 60 days overdue.
    Days31To60,
    /// 61 to 90 days overdue.
    Days61To90,
    /// More than 90 days overdue.
    Over90,
}

impl AgingBucket {
    /// Classifies a number of days overdue.
    #[must_use]
    pub const fn for_days_overdue(days: i64) -> Self {
        if days <= 30 {
            Self::Current
        } else if days <= 60 {
            Self::Days31To60
        } else if days <= 90 {
            Self::Days61To90
        } else {
            Self::Over90
        }
    }

    /// Returns the bucket label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Days31To60 => "31-60",
            Self::Days61To90 => "61-90",
            Self::Over90 => "90+",
        }
    }
}

impl fmt::Display for AgingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Amounts per bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingBuckets {
    /// Up to 30 days.
    pub current: Decimal,
    /// 31 to 60 days.
    pub days_31_to_60: Decimal,
    /// 61 to 90 days.
    pub days_61_to_90: Decimal,
    /// More than 90 days.
    pub over_90: Decimal,
}

impl AgingBuckets {
    /// Adds an amount to a bucket.
    pub fn add(&mut self, bucket: AgingBucket, amount: Decimal) {
        match bucket {
            AgingBucket::Current => self.current += amount,
            AgingBucket::Days31To60 => self.days_31_to_60 += amount,
            AgingBucket::Days61To90 => self.days_61_to_90 += amount,
            AgingBucket::Over90 => self.over_90 += amount,
        }
    }

    /// Adds every bucket of `other`.
    pub fn merge(&mut self, other: &Self) {
        self.current += other.current;
        self.days_31_to_60 += other.days_31_to_60;
        self.days_61_to_90 += other.days_61_to_90;
        self.over_90 += other.over_90;
    }

    /// Amount in one bucket.
    #[must_use]
    pub const fn get(&self, bucket: AgingBucket) -> Decimal {
        match bucket {
            AgingBucket::Current => self.current,
            AgingBucket::Days31To60 => self.days_31_to_60,
            AgingBucket::Days61To90 => self.days_61_to_90,
            AgingBucket::Over90 => self.over_90,
        }
    }

    /// Sum of all buckets.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.current + self.days_31_to_60 + self.days_61_to_90 + self.over_90
    }
}

/// One customer row of the aging report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAging {
    /// Customer ID.
    pub customer_id: CustomerId,
    /// Statement the row was built from.
    pub statement_id: StatementId,
    /// When that statement was generated.
    pub statement_date: DateTime<Utc>,
    /// Statement currency.
    pub currency: Currency,
    /// Outstanding amounts per bucket.
    pub buckets: AgingBuckets,
    /// Total outstanding.
    pub total: Decimal,
    /// Number of outstanding invoices.
    pub invoice_count: usize,
}

/// Grand totals of one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingTotals {
    /// Currency of the totals.
    pub currency: Currency,
    /// Amounts per bucket.
    pub buckets: AgingBuckets,
    /// Total outstanding.
    pub total: Decimal,
    /// Number of customers contributing.
    pub customer_count: usize,
}

/// Receivables aging across customers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingReport {
    /// When the report was built.
    pub generated_at: DateTime<Utc>,
    /// One row per customer, largest total first.
    pub customers: Vec<CustomerAging>,
    /// Grand totals, one entry per statement currency.
    pub totals: Vec<AgingTotals>,
}
