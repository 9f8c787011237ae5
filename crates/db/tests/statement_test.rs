//! Integration tests for the statement repository.
//!
//! Run with `cargo test -p freightbook-db -- --ignored` against a migrated database.

#![allow(clippy::unwrap_used)]

mod common;

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use freightbook_core::batch::BatchOutcome;
use freightbook_core::statement::{ExportFormat, StatementPeriod};
use freightbook_db::{NO_ACTIVITY, StatementRepository};
use freightbook_shared::AppError;
use freightbook_shared::types::{CustomerId, StatementId};

use common::{InvoiceFixture, clock_at, connect, create_customer, create_outgoing_invoice, day};

fn period(start: (i32, u32, u32), end: (i32, u32, u32)) -> StatementPeriod {
    StatementPeriod::from_dates(
        NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
        NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
    )
    .unwrap()
}

async fn customer_with_open_invoice(db: &sea_orm::DatabaseConnection, email: Option<&str>) -> CustomerId {
    let customer_id = create_customer(db, email).await;
    create_outgoing_invoice(
        db,
        customer_id,
        InvoiceFixture {
            number: "INV-2024-001".into(),
            issue_date: day(2024, 1, 5),
            due_date: day(2024, 2, 4),
            total: dec!(1000),
            status: "sent",
            paid_date: None,
        },
    )
    .await;
    customer_id
}

// ============================================================================
// Generation
// ============================================================================

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_carried_invoice_statement_and_aging() {
    let db = connect().await;
    let repo = StatementRepository::new(db.clone(), clock_at(day(2024, 4, 1)));
    let customer_id = customer_with_open_invoice(&db, None).await;

    let summary = repo
        .generate(customer_id, period((2024, 3, 1), (2024, 3, 31)), None)
        .await
        .unwrap();
    assert_eq!(summary.opening_balance.amount, dec!(1000));
    assert_eq!(summary.total_invoiced.amount, dec!(0));
    assert_eq!(summary.total_paid.amount, dec!(0));
    assert_eq!(summary.closing_balance.amount, dec!(1000));
    assert_eq!(summary.transaction_count, 0);

    let statement = repo.get(summary.statement_id).await.unwrap();
    assert_eq!(statement.outstanding_invoices.len(), 1);
    assert_eq!(statement.outstanding_invoices[0].days_overdue, 56);

    let report = repo.aging_report().await.unwrap();
    let row = report
        .customers
        .iter()
        .find(|c| c.customer_id == customer_id)
        .unwrap();
    assert_eq!(row.buckets.days_31_to_60, dec!(1000));
    assert_eq!(row.total, dec!(1000));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_in_period_invoice_statement() {
    let db = connect().await;
    let repo = StatementRepository::new(db.clone(), clock_at(day(2024, 2, 1)));
    let customer_id = customer_with_open_invoice(&db, None).await;

    let summary = repo
        .generate(customer_id, period((2024, 1, 1), (2024, 1, 31)), None)
        .await
        .unwrap();
    assert_eq!(summary.opening_balance.amount, dec!(0));
    assert_eq!(summary.total_invoiced.amount, dec!(1000));
    assert_eq!(summary.closing_balance.amount, dec!(1000));
    assert_eq!(summary.invoice_count, 1);

    let statement = repo.get(summary.statement_id).await.unwrap();
    assert_eq!(statement.outstanding_invoices[0].days_overdue, 0);
    assert_eq!(statement.transactions[0].balance.amount, dec!(1000));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_latest_picks_newest_live_statement() {
    let db = connect().await;
    let customer_id = customer_with_open_invoice(&db, None).await;
    let february = StatementRepository::new(db.clone(), clock_at(day(2024, 3, 1)));
    let march = StatementRepository::new(db.clone(), clock_at(day(2024, 4, 1)));

    let older = february
        .generate(customer_id, period((2024, 2, 1), (2024, 2, 29)), None)
        .await
        .unwrap();
    let newer = march
        .generate(customer_id, period((2024, 3, 1), (2024, 3, 31)), None)
        .await
        .unwrap();

    let latest = march.latest().await.unwrap();
    let mine: Vec<_> = latest.iter().filter(|s| s.customer_id == customer_id).collect();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, newer.statement_id);

    march.delete(newer.statement_id, None).await.unwrap();
    let latest = march.latest().await.unwrap();
    let mine = latest.iter().find(|s| s.customer_id == customer_id).unwrap();
    assert_eq!(mine.id, older.statement_id);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_generate_rejects_unknown_customer() {
    let db = connect().await;
    let repo = StatementRepository::new(db.clone(), clock_at(day(2024, 2, 1)));

    let err = repo
        .generate(CustomerId::new(), period((2024, 1, 1), (2024, 1, 31)), None)
        .await
        .unwrap_err();
    assert_eq!(AppError::from(err).status_code(), 404);
}

// ============================================================================
// Regeneration
// ============================================================================

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_regenerate_is_two_steps() {
    let db = connect().await;
    let repo = StatementRepository::new(db.clone(), clock_at(day(2024, 4, 1)));
    let customer_id = customer_with_open_invoice(&db, None).await;
    let first = repo
        .generate(customer_id, period((2024, 3, 1), (2024, 3, 31)), None)
        .await
        .unwrap();

    let request = repo.regenerate(first.statement_id, None).await.unwrap();
    assert_eq!(request.customer_id, customer_id);
    assert!(repo.get(first.statement_id).await.is_err());

    let period = StatementPeriod::new(request.start_date, request.end_date).unwrap();
    let second = repo.generate(customer_id, period, None).await.unwrap();
    assert_ne!(second.statement_id, first.statement_id);
    assert_eq!(second.closing_balance, first.closing_balance);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_replace_is_atomic_and_keeps_period() {
    let db = connect().await;
    let repo = StatementRepository::new(db.clone(), clock_at(day(2024, 4, 1)));
    let customer_id = customer_with_open_invoice(&db, None).await;
    let first = repo
        .generate(customer_id, period((2024, 3, 1), (2024, 3, 31)), None)
        .await
        .unwrap();

    let replaced = repo.replace(first.statement_id, None).await.unwrap();
    assert_ne!(replaced.statement_id, first.statement_id);
    assert_eq!(replaced.start_date, first.start_date);
    assert_eq!(replaced.end_date, first.end_date);
    assert!(repo.get(first.statement_id).await.is_err());

    let err = repo.replace(StatementId::new(), None).await.unwrap_err();
    assert_eq!(AppError::from(err).status_code(), 404);
}

// ============================================================================
// Bookkeeping
// ============================================================================

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_export_and_send() {
    let db = connect().await;
    let repo = StatementRepository::new(db.clone(), clock_at(day(2024, 4, 1)));
    let customer_id = customer_with_open_invoice(&db, Some("ap@customer.example.com")).await;
    let summary = repo
        .generate(customer_id, period((2024, 3, 1), (2024, 3, 31)), None)
        .await
        .unwrap();

    let exported = repo
        .mark_exported(summary.statement_id, ExportFormat::Pdf, None)
        .await
        .unwrap();
    assert_eq!(exported.export_format, Some(ExportFormat::Pdf));

    let sent = repo.send(summary.statement_id, None, None).await.unwrap();
    assert_eq!(sent.sent_to.as_deref(), Some("ap@customer.example.com"));

    let stored = repo.get(summary.statement_id).await.unwrap();
    assert_eq!(stored.exported_at, Some(day(2024, 4, 1)));
    assert_eq!(stored.sent_at, Some(day(2024, 4, 1)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_send_without_address_is_validation_error() {
    let db = connect().await;
    let repo = StatementRepository::new(db.clone(), clock_at(day(2024, 4, 1)));
    let customer_id = customer_with_open_invoice(&db, None).await;
    let summary = repo
        .generate(customer_id, period((2024, 3, 1), (2024, 3, 31)), None)
        .await
        .unwrap();

    let err = repo.send(summary.statement_id, None, None).await.unwrap_err();
    assert_eq!(AppError::from(err).status_code(), 400);
    assert!(repo.get(summary.statement_id).await.unwrap().sent_at.is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_delete_hides_statement() {
    let db = connect().await;
    let repo = StatementRepository::new(db.clone(), clock_at(day(2024, 4, 1)));
    let customer_id = customer_with_open_invoice(&db, None).await;
    let summary = repo
        .generate(customer_id, period((2024, 3, 1), (2024, 3, 31)), None)
        .await
        .unwrap();

    repo.delete(summary.statement_id, None).await.unwrap();
    assert!(repo.get(summary.statement_id).await.is_err());
    assert!(repo.delete(summary.statement_id, None).await.is_err());
}

// ============================================================================
// Bulk generation
// ============================================================================

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_bulk_generate_outcomes() {
    let db = connect().await;
    let repo = StatementRepository::new(db.clone(), clock_at(day(2024, 4, 1)));
    let active = customer_with_open_invoice(&db, None).await;
    let idle = create_customer(&db, None).await;
    let unknown = CustomerId::new();

    let report = repo
        .bulk_generate(
            period((2024, 3, 1), (2024, 3, 31)),
            Some(vec![active, idle, unknown]),
        )
        .await
        .unwrap();
    assert_eq!((report.succeeded, report.skipped, report.failed), (1, 1, 1));
    assert!(matches!(report.items[0].outcome, BatchOutcome::Succeeded { .. }));
    assert!(matches!(&report.items[1].outcome, BatchOutcome::Skipped { reason } if reason == NO_ACTIVITY));
    assert!(matches!(report.items[2].outcome, BatchOutcome::Failed { .. }));

    let page = repo
        .customer_statements(active, freightbook_shared::types::PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.meta.total, 1);
}
