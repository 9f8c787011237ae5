//! Property-based tests for StatementService.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use freightbook_shared::clock::start_of_day;
use freightbook_shared::types::{Currency, CurrencyAmount, CustomerId, InvoiceId};

use crate::statement::service::StatementService;
use crate::statement::types::{InvoiceRecord, InvoiceStatus, StatementPeriod};

fn epoch() -> DateTime<Utc> {
    start_of_day(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
}

fn arb_status() -> impl Strategy<Value = InvoiceStatus> {
    prop_oneof![
        Just(InvoiceStatus::Draft),
        Just(InvoiceStatus::Sent),
        Just(InvoiceStatus::Paid),
        Just(InvoiceStatus::Overdue),
        Just(InvoiceStatus::Cancelled),
    ]
}

/// Invoices spread over a year, settled in full when paid.
fn arb_invoice() -> impl Strategy<Value = InvoiceRecord> {
    (
        0i64..365,
        0i64..90,
        prop::option::of(0i64..120),
        1i64..1_000_000,
        arb_status(),
        0u32..1000,
    )
        .prop_map(|(issue_day, terms, paid_after, cents, status, number)| {
            let issue_date = epoch() + Duration::days(issue_day);
            let total = CurrencyAmount::new(Decimal::new(cents, 2), Currency::Eur);
            InvoiceRecord {
                id: InvoiceId::new(),
                invoice_number: format!("INV-{number:04}"),
                issue_date,
                due_date: issue_date + Duration::days(terms),
                total_amount: total,
                paid_amount: None,
                paid_date: paid_after.map(|d| issue_date + Duration::days(d)),
                status,
            }
        })
}

fn arb_period() -> impl Strategy<Value = StatementPeriod> {
    (0i64..365, 0i64..120).prop_map(|(start, len)| {
        let start = epoch() + Duration::days(start);
        StatementPeriod::new(start, start + Duration::days(len) + Duration::hours(23)).unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// closing = opening + invoiced - paid, and equals the outstanding total.
    #[test]
    fn prop_closing_balance_identity(
        invoices in prop::collection::vec(arb_invoice(), 0..30),
        period in arb_period(),
    ) {
        let s = StatementService::build(CustomerId::new(), period, Currency::Eur, &invoices, epoch())
            .unwrap();

        prop_assert_eq!(
            s.closing_balance.amount,
            s.opening_balance.amount + s.total_invoiced.amount - s.total_paid.amount
        );
        prop_assert_eq!(s.closing_balance.amount, s.outstanding_total().amount);

        if let Some(last) = s.transactions.last() {
            prop_assert_eq!(last.balance.amount, s.closing_balance.amount);
        }
    }

    /// Lines ascend by date; outstanding invoices ascend by due date.
    #[test]
    fn prop_ordering(
        invoices in prop::collection::vec(arb_invoice(), 0..30),
        period in arb_period(),
    ) {
        let s = StatementService::build(CustomerId::new(), period, Currency::Eur, &invoices, epoch())
            .unwrap();

        for pair in s.transactions.windows(2) {
            prop_assert!(pair[0].date <= pair[1].date);
        }
        for pair in s.outstanding_invoices.windows(2) {
            prop_assert!(pair[0].due_date <= pair[1].due_date);
        }
        for line in &s.transactions {
            prop_assert!(period.contains(line.date));
        }
        for o in &s.outstanding_invoices {
            prop_assert!(o.days_overdue >= 0);
        }
    }
}
