//! Aging report builder.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use freightbook_shared::types::{Currency, CustomerId};

use crate::aging::types::{AgingBucket, AgingBuckets, AgingReport, AgingTotals, CustomerAging};
use crate::statement::StatementOfAccounts;

/// Stateless aging report builder.
pub struct AgingService;

impl AgingService {
    /// Keeps the most recently generated statement of each customer.
    #[must_use]
    pub fn latest_per_customer(statements: Vec<StatementOfAccounts>) -> Vec<StatementOfAccounts> {
        let mut latest: BTreeMap<CustomerId, StatementOfAccounts> = BTreeMap::new();
        for statement in statements {
            let newer = latest.get(&statement.customer_id).is_none_or(|existing| {
                (statement.generated_date, statement.id) > (existing.generated_date, existing.id)
            });
            if newer {
                latest.insert(statement.customer_id, statement);
            }
        }
        latest.into_values().collect()
    }

    /// Buckets the outstanding invoices of one statement.
    #[must_use]
    pub fn customer_row(statement: &StatementOfAccounts) -> CustomerAging {
        let mut buckets = AgingBuckets::default();
        for invoice in &statement.outstanding_invoices {
            buckets.add(
                AgingBucket::for_days_overdue(invoice.days_overdue),
                invoice.amount.amount,
            );
        }
        CustomerAging {
            customer_id: statement.customer_id,
            statement_id: statement.id,
            statement_date: statement.generated_date,
            currency: statement.currency,
            total: buckets.total(),
            buckets,
            invoice_count: statement.outstanding_invoices.len(),
        }
    }

    /// Builds the report from the latest statement of each customer.
    ///
    /// Older statements in the input are ignored. Customers are grouped by
    /// currency and ranked by outstanding total inside each group.
    #[must_use]
    pub fn build(statements: Vec<StatementOfAccounts>, generated_at: DateTime<Utc>) -> AgingReport {
        let mut customers: Vec<CustomerAging> = Self::latest_per_customer(statements)
            .iter()
            .map(Self::customer_row)
            .collect();
        customers.sort_by(|a, b| {
            a.currency
                .cmp(&b.currency)
                .then_with(|| b.total.cmp(&a.total))
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });

        let mut by_currency: BTreeMap<Currency, AgingTotals> = BTreeMap::new();
        for row in &customers {
            let totals = by_currency.entry(row.currency).or_insert(AgingTotals {
                currency: row.currency,
                buckets: AgingBuckets::default(),
                total: rust_decimal::Decimal::ZERO,
                customer_count: 0,
            });
            totals.buckets.merge(&row.buckets);
            totals.total += row.total;
            totals.customer_count += 1;
        }

        AgingReport {
            generated_at,
            customers,
            totals: by_currency.into_values().collect(),
        }
    }

    /// The `limit` customers owing the most in each currency.
    #[must_use]
    pub fn top_outstanding(report: &AgingReport, limit: usize) -> Vec<CustomerAging> {
        let mut taken: BTreeMap<Currency, usize> = BTreeMap::new();
        report
            .customers
            .iter()
            .filter(|row| {
                let count = taken.entry(row.currency).or_default();
                *count += 1;
                *count <= limit
            })
            .cloned()
            .collect()
    }
}
