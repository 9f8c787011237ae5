//! Integration tests for the tracking repository.
//!
//! Run with `cargo test -p freightbook-db -- --ignored` against a migrated database.

#![allow(clippy::unwrap_used)]

mod common;

use chrono::Duration;
use futures::future::join_all;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use freightbook_core::batch::BatchOutcome;
use freightbook_core::tracking::{BulkPolicy, NewTracking, TrackingError, TrackingStatus};
use freightbook_db::entities::audit_log;
use freightbook_db::{ReceiveInvoiceInput, RepositoryError, TrackingRepository};
use freightbook_shared::types::{Currency, CurrencyAmount, UserId};
use freightbook_shared::AppError;

use common::{
    InvoiceFixture, clock_at, connect, create_customer, create_incoming_invoice,
    create_outgoing_invoice, create_partner, create_shipment, day,
};

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_then_duplicate_is_conflict() {
    let db = connect().await;
    let repo = TrackingRepository::new(db.clone(), clock_at(day(2024, 3, 1)));
    let partner_id = create_partner(&db).await;
    let shipment_id = create_shipment(&db, Some(partner_id), None, None).await;
    let input = NewTracking {
        shipment_id,
        partner_id,
        expected_date: day(2024, 3, 4),
        expected_amount: Some(CurrencyAmount::new(dec!(450), Currency::Eur)),
    };

    let tracking = repo.create(input.clone(), None).await.unwrap();
    assert_eq!(tracking.status, TrackingStatus::Expected);
    assert_eq!(tracking.reminders_sent, 0);

    let err = repo.create(input, None).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Tracking(TrackingError::AlreadyTracked(id)) if id == shipment_id
    ));
    assert_eq!(AppError::from(err).status_code(), 409);

    let audits = audit_log::Entity::find()
        .filter(audit_log::Column::EntityId.eq(tracking.id.into_inner()))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(audits, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_creates_yield_one_tracking() {
    let db = connect().await;
    let repo = TrackingRepository::new(db.clone(), clock_at(day(2024, 3, 1)));
    let partner_id = create_partner(&db).await;
    let shipment_id = create_shipment(&db, Some(partner_id), None, None).await;
    let input = NewTracking {
        shipment_id,
        partner_id,
        expected_date: day(2024, 3, 4),
        expected_amount: None,
    };

    let results = join_all((0..8).map(|_| repo.create(input.clone(), None))).await;
    let created = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(created, 1);
    for err in results.into_iter().filter_map(Result::err) {
        assert_eq!(AppError::from(err).error_code(), "CONFLICT");
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_unknown_shipment_is_not_found() {
    let db = connect().await;
    let repo = TrackingRepository::new(db.clone(), clock_at(day(2024, 3, 1)));
    let partner_id = create_partner(&db).await;

    let err = repo
        .create(
            NewTracking {
                shipment_id: freightbook_shared::types::ShipmentId::new(),
                partner_id,
                expected_date: day(2024, 3, 4),
                expected_amount: None,
            },
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(AppError::from(err).status_code(), 404);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_full_lifecycle_to_paid() {
    let db = connect().await;
    let repo = TrackingRepository::new(db.clone(), clock_at(day(2024, 3, 10)));
    let partner_id = create_partner(&db).await;
    let shipment_id = create_shipment(&db, Some(partner_id), None, None).await;
    let invoice_id = create_incoming_invoice(&db, partner_id, shipment_id, dec!(480)).await;
    let tracking = repo
        .create(
            NewTracking {
                shipment_id,
                partner_id,
                expected_date: day(2024, 3, 4),
                expected_amount: Some(CurrencyAmount::new(dec!(450), Currency::Eur)),
            },
            None,
        )
        .await
        .unwrap();

    let received = repo
        .mark_received(
            tracking.id,
            ReceiveInvoiceInput {
                invoice_id,
                received_date: None,
                actual_amount: None,
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(received.status, TrackingStatus::Received);
    assert_eq!(received.actual_amount.unwrap().amount, dec!(480));
    assert_eq!(received.received_date, Some(day(2024, 3, 10)));

    let approver = UserId::new();
    let approved = repo
        .approve(tracking.id, approver, Some("matches rate card".into()))
        .await
        .unwrap();
    assert_eq!(approved.approved_by, Some(approver));
    assert_eq!(repo.pending_approvals().await.unwrap().iter().filter(|t| t.id == tracking.id).count(), 0);

    let paid = repo
        .mark_paid(tracking.id, "PAY-2024-0042".into(), None, None)
        .await
        .unwrap();
    assert_eq!(paid.status, TrackingStatus::Paid);

    let stored = repo.get(tracking.id).await.unwrap();
    assert_eq!(stored, paid);
    assert_eq!(stored.internal_notes.lines().count(), 3);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_receive_rejects_outgoing_invoice() {
    let db = connect().await;
    let repo = TrackingRepository::new(db.clone(), clock_at(day(2024, 3, 10)));
    let partner_id = create_partner(&db).await;
    let shipment_id = create_shipment(&db, Some(partner_id), None, None).await;
    let customer_id = create_customer(&db, None).await;
    let customer_invoice = create_outgoing_invoice(
        &db,
        customer_id,
        InvoiceFixture {
            number: "INV-2024-077".to_string(),
            issue_date: day(2024, 3, 1),
            due_date: day(2024, 3, 31),
            total: dec!(900),
            status: "sent",
            paid_date: None,
        },
    )
    .await;
    let tracking = repo
        .create(
            NewTracking {
                shipment_id,
                partner_id,
                expected_date: day(2024, 3, 4),
                expected_amount: None,
            },
            None,
        )
        .await
        .unwrap();

    let err = repo
        .mark_received(
            tracking.id,
            ReceiveInvoiceInput {
                invoice_id: customer_invoice,
                received_date: None,
                actual_amount: None,
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Tracking(TrackingError::InvoiceNotFound(id)) if id == customer_invoice
    ));

    let stored = repo.get(tracking.id).await.unwrap();
    assert_eq!(stored.status, TrackingStatus::Expected);
    assert_eq!(stored.invoice_id, None);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_two_reminders_leave_tracking_missing() {
    let db = connect().await;
    let repo = TrackingRepository::new(db.clone(), clock_at(day(2024, 3, 20)));
    let partner_id = create_partner(&db).await;
    let shipment_id = create_shipment(&db, Some(partner_id), None, None).await;
    let tracking = repo
        .create(
            NewTracking {
                shipment_id,
                partner_id,
                expected_date: day(2024, 3, 4),
                expected_amount: None,
            },
            None,
        )
        .await
        .unwrap();

    repo.send_reminder(tracking.id, None, None).await.unwrap();
    let after = repo
        .send_reminder(tracking.id, Some("second call".into()), None)
        .await
        .unwrap();
    assert_eq!(after.reminders_sent, 2);
    assert_eq!(after.status, TrackingStatus::Missing);
    assert_eq!(after.last_reminder_date, Some(day(2024, 3, 20)));

    let missing = repo.missing(10).await.unwrap();
    let row = missing.iter().find(|m| m.tracking.id == tracking.id).unwrap();
    assert_eq!(row.days_overdue, 16);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_resolve_non_disputed_changes_nothing() {
    let db = connect().await;
    let repo = TrackingRepository::new(db.clone(), clock_at(day(2024, 3, 10)));
    let partner_id = create_partner(&db).await;
    let shipment_id = create_shipment(&db, Some(partner_id), None, None).await;
    let invoice_id = create_incoming_invoice(&db, partner_id, shipment_id, dec!(100)).await;
    let tracking = repo
        .create(
            NewTracking {
                shipment_id,
                partner_id,
                expected_date: day(2024, 3, 4),
                expected_amount: None,
            },
            None,
        )
        .await
        .unwrap();
    let received = repo
        .mark_received(
            tracking.id,
            ReceiveInvoiceInput {
                invoice_id,
                received_date: None,
                actual_amount: None,
            },
            None,
        )
        .await
        .unwrap();

    let err = repo
        .resolve_dispute(tracking.id, "ok".into(), TrackingStatus::Cancelled, None)
        .await
        .unwrap_err();
    assert_eq!(AppError::from(err).error_code(), "INVALID_STATE");
    assert_eq!(repo.get(tracking.id).await.unwrap(), received);
}

// ============================================================================
// Bulk creation
// ============================================================================

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_bulk_create_reports_each_shipment() {
    let db = connect().await;
    let now = day(2031, 6, 20);
    let repo = TrackingRepository::new(db.clone(), clock_at(now));
    let partner_id = create_partner(&db).await;

    let eligible =
        create_shipment(&db, Some(partner_id), Some(now - Duration::days(10)), Some(dec!(300)))
            .await;
    let recent = create_shipment(&db, Some(partner_id), Some(now - Duration::days(2)), None).await;
    let no_partner = create_shipment(&db, None, Some(now - Duration::days(10)), None).await;
    let invoiced = create_shipment(&db, Some(partner_id), Some(now - Duration::days(12)), None).await;
    create_incoming_invoice(&db, partner_id, invoiced, dec!(50)).await;

    let report = repo.bulk_create(BulkPolicy::default()).await.unwrap();
    let outcome = |id| {
        report
            .items
            .iter()
            .find(|item| item.key == id)
            .map(|item| item.outcome.clone())
    };

    assert!(matches!(outcome(eligible), Some(BatchOutcome::Succeeded { .. })));
    assert!(outcome(recent).is_none());
    assert!(matches!(outcome(no_partner), Some(BatchOutcome::Skipped { reason }) if reason == "no_partner"));
    assert!(matches!(outcome(invoiced), Some(BatchOutcome::Skipped { .. })));

    let created = repo
        .list(
            freightbook_core::tracking::TrackingFilter {
                status: None,
                partner_id: Some(partner_id),
            },
            freightbook_shared::types::PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(created.meta.total, 1);
    let tracking = &created.data[0];
    assert_eq!(tracking.shipment_id, eligible);
    assert_eq!(tracking.expected_date, now - Duration::days(7));
    assert_eq!(tracking.expected_amount.unwrap().amount, dec!(300));

    let again = repo.bulk_create(BulkPolicy::default()).await.unwrap();
    assert!(again.items.iter().all(|item| item.key != eligible
        || matches!(item.outcome, BatchOutcome::Skipped { .. })));
}
