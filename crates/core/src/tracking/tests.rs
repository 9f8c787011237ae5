//! Unit tests for tracking transitions and projections.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rstest::rstest;
use rust_decimal_macros::dec;

use freightbook_shared::types::{
    Currency, CurrencyAmount, InvoiceId, PartnerId, ShipmentId, UserId,
};

use super::*;
use crate::audit::LedgerEvent;
use crate::dunning::Severity;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
}

fn eur(amount: rust_decimal::Decimal) -> CurrencyAmount {
    CurrencyAmount::new(amount, Currency::Eur)
}

fn tracking() -> IncomingInvoiceTracking {
    TrackingService::create(
        NewTracking {
            shipment_id: ShipmentId::new(),
            partner_id: PartnerId::new(),
            expected_date: now() - Duration::days(5),
            expected_amount: Some(eur(dec!(800))),
        },
        now() - Duration::days(10),
    )
    .unwrap()
}

fn in_status(status: TrackingStatus) -> IncomingInvoiceTracking {
    IncomingInvoiceTracking {
        status,
        ..tracking()
    }
}

fn receipt(total: CurrencyAmount) -> InvoiceReceipt {
    InvoiceReceipt {
        invoice_id: InvoiceId::new(),
        invoice_total: total,
        received_date: None,
        actual_amount: None,
    }
}

// ============================================================================
// create
// ============================================================================

#[test]
fn test_create_starts_expected() {
    let t = tracking();
    assert_eq!(t.status, TrackingStatus::Expected);
    assert_eq!(t.reminders_sent, 0);
    assert!(t.internal_notes.is_empty());
    assert_eq!(t.expected_amount, Some(eur(dec!(800))));
}

#[test]
fn test_create_rejects_negative_amount() {
    let result = TrackingService::create(
        NewTracking {
            shipment_id: ShipmentId::new(),
            partner_id: PartnerId::new(),
            expected_date: now(),
            expected_amount: Some(eur(dec!(-1))),
        },
        now(),
    );
    assert_eq!(result, Err(TrackingError::NegativeAmount));
}

// ============================================================================
// mark_received
// ============================================================================

#[test]
fn test_mark_received_defaults_to_invoice_total_and_now() {
    let mut t = tracking();
    let r = receipt(eur(dec!(812.40)));
    let event = TrackingService::mark_received(&mut t, r, now()).unwrap();

    assert_eq!(t.status, TrackingStatus::Received);
    assert_eq!(t.invoice_id, Some(r.invoice_id));
    assert_eq!(t.actual_amount, Some(eur(dec!(812.40))));
    assert_eq!(t.received_date, Some(now()));
    assert!(matches!(event, LedgerEvent::InvoiceReceived { .. }));
}

#[test]
fn test_mark_received_uses_explicit_values() {
    let mut t = in_status(TrackingStatus::Missing);
    let received = now() - Duration::days(1);
    let r = InvoiceReceipt {
        received_date: Some(received),
        actual_amount: Some(eur(dec!(790))),
        ..receipt(eur(dec!(812.40)))
    };
    TrackingService::mark_received(&mut t, r, now()).unwrap();
    assert_eq!(t.actual_amount, Some(eur(dec!(790))));
    assert_eq!(t.received_date, Some(received));
}

#[rstest]
#[case(TrackingStatus::Received)]
#[case(TrackingStatus::Approved)]
#[case(TrackingStatus::Paid)]
#[case(TrackingStatus::Disputed)]
#[case(TrackingStatus::Cancelled)]
fn test_mark_received_rejected(#[case] status: TrackingStatus) {
    let mut t = in_status(status);
    let before = t.clone();
    let err = TrackingService::mark_received(&mut t, receipt(eur(dec!(1))), now()).unwrap_err();
    assert!(matches!(err, TrackingError::InvalidTransition { .. }));
    assert_eq!(t, before);
}

// ============================================================================
// send_reminder
// ============================================================================

#[test]
fn test_two_reminders_mark_missing() {
    let mut t = tracking();
    TrackingService::send_reminder(&mut t, None, now()).unwrap();
    assert_eq!(t.status, TrackingStatus::Missing);
    let later = now() + Duration::days(3);
    TrackingService::send_reminder(&mut t, Some("called dispatcher"), later).unwrap();

    assert_eq!(t.reminders_sent, 2);
    assert_eq!(t.status, TrackingStatus::Missing);
    assert_eq!(t.last_reminder_date, Some(later));
    let lines: Vec<&str> = t.internal_notes.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "[2024-03-01T09:30:00Z] Reminder #1 sent");
    assert_eq!(
        lines[1],
        "[2024-03-04T09:30:00Z] Reminder #2 sent: called dispatcher"
    );
}

#[test]
fn test_reminder_keeps_non_expected_status() {
    let mut t = in_status(TrackingStatus::Disputed);
    TrackingService::send_reminder(&mut t, None, now()).unwrap();
    assert_eq!(t.status, TrackingStatus::Disputed);
    assert_eq!(t.reminders_sent, 1);
}

#[rstest]
#[case(TrackingStatus::Paid)]
#[case(TrackingStatus::Cancelled)]
fn test_reminder_on_terminal_rejected(#[case] status: TrackingStatus) {
    let mut t = in_status(status);
    let before = t.clone();
    let err = TrackingService::send_reminder(&mut t, None, now()).unwrap_err();
    assert_eq!(
        err,
        TrackingError::NotAllowed {
            action: "send a reminder for",
            status
        }
    );
    assert_eq!(t, before);
}

// ============================================================================
// dispute / resolve
// ============================================================================

#[test]
fn test_dispute_records_reason() {
    let mut t = in_status(TrackingStatus::Received);
    let event = TrackingService::dispute(&mut t, "  rate mismatch ", now()).unwrap();
    assert_eq!(t.status, TrackingStatus::Disputed);
    assert_eq!(t.dispute_reason.as_deref(), Some("rate mismatch"));
    assert_eq!(t.dispute_date, Some(now()));
    assert_eq!(
        event,
        LedgerEvent::Disputed {
            reason: "rate mismatch".to_string(),
            previous_status: TrackingStatus::Received,
        }
    );
}

#[test]
fn test_dispute_requires_reason() {
    let mut t = tracking();
    assert_eq!(
        TrackingService::dispute(&mut t, "   ", now()),
        Err(TrackingError::RequiredField("Dispute reason"))
    );
    assert_eq!(t.status, TrackingStatus::Expected);
}

#[test]
fn test_dispute_again_replaces_reason() {
    let mut t = in_status(TrackingStatus::Received);
    TrackingService::dispute(&mut t, "rate mismatch", now()).unwrap();
    let later = now() + Duration::days(2);
    let event = TrackingService::dispute(&mut t, "wrong weight", later).unwrap();

    assert_eq!(t.status, TrackingStatus::Disputed);
    assert_eq!(t.dispute_reason.as_deref(), Some("wrong weight"));
    assert_eq!(t.dispute_date, Some(later));
    assert!(t.internal_notes.contains("Disputed: wrong weight"));
    assert_eq!(
        event,
        LedgerEvent::Disputed {
            reason: "wrong weight".to_string(),
            previous_status: TrackingStatus::Disputed,
        }
    );
}

#[rstest]
#[case(TrackingStatus::Paid)]
#[case(TrackingStatus::Cancelled)]
fn test_dispute_terminal_rejected(#[case] status: TrackingStatus) {
    let mut t = in_status(status);
    assert!(matches!(
        TrackingService::dispute(&mut t, "late", now()),
        Err(TrackingError::NotAllowed { .. })
    ));
}

#[test]
fn test_resolve_dispute_to_received() {
    let mut t = tracking();
    TrackingService::dispute(&mut t, "wrong partner", now()).unwrap();
    let later = now() + Duration::days(2);
    TrackingService::resolve_dispute(&mut t, "partner corrected", TrackingStatus::Received, later)
        .unwrap();
    assert_eq!(t.status, TrackingStatus::Received);
    assert_eq!(t.dispute_resolved_date, Some(later));
    assert!(
        t.internal_notes
            .ends_with("Dispute resolved (received): partner corrected")
    );
}

#[test]
fn test_resolve_non_disputed_changes_nothing() {
    let mut t = in_status(TrackingStatus::Received);
    let before = t.clone();
    let err =
        TrackingService::resolve_dispute(&mut t, "ok", TrackingStatus::Cancelled, now()).unwrap_err();
    assert_eq!(
        err,
        TrackingError::InvalidTransition {
            from: TrackingStatus::Received,
            to: TrackingStatus::Cancelled,
        }
    );
    assert_eq!(t, before);
}

#[test]
fn test_resolve_to_invalid_status() {
    let mut t = in_status(TrackingStatus::Disputed);
    assert_eq!(
        TrackingService::resolve_dispute(&mut t, "ok", TrackingStatus::Paid, now()),
        Err(TrackingError::InvalidResolution(TrackingStatus::Paid))
    );
}

// ============================================================================
// cancel
// ============================================================================

#[test]
fn test_cancel_appends_note() {
    let mut t = tracking();
    let event = TrackingService::cancel(&mut t, "shipment returned", now()).unwrap();
    assert_eq!(t.status, TrackingStatus::Cancelled);
    assert!(t.internal_notes.ends_with("Cancelled: shipment returned"));
    assert!(event.is_some());
}

#[test]
fn test_cancel_twice_is_noop() {
    let mut t = in_status(TrackingStatus::Cancelled);
    let before = t.clone();
    assert_eq!(TrackingService::cancel(&mut t, "again", now()), Ok(None));
    assert_eq!(t, before);
}

#[test]
fn test_cancel_paid_rejected() {
    let mut t = in_status(TrackingStatus::Paid);
    assert!(matches!(
        TrackingService::cancel(&mut t, "oops", now()),
        Err(TrackingError::NotAllowed { action: "cancel", .. })
    ));
    assert_eq!(t.status, TrackingStatus::Paid);
}

// ============================================================================
// approve / pay
// ============================================================================

#[test]
fn test_full_lifecycle() {
    let mut t = tracking();
    let approver = UserId::new();
    TrackingService::mark_received(&mut t, receipt(eur(dec!(800))), now()).unwrap();
    TrackingService::approve(&mut t, approver, Some("matches PO".to_string()), now()).unwrap();
    assert_eq!(t.status, TrackingStatus::Approved);
    assert_eq!(t.approved_by, Some(approver));
    assert_eq!(t.approval_notes.as_deref(), Some("matches PO"));

    TrackingService::mark_paid(&mut t, "SEPA-2024-118", None, now()).unwrap();
    assert_eq!(t.status, TrackingStatus::Paid);
    assert_eq!(t.payment_reference.as_deref(), Some("SEPA-2024-118"));
    assert_eq!(t.paid_date, Some(now()));
    assert_eq!(t.internal_notes.lines().count(), 3);
}

#[test]
fn test_approve_requires_received() {
    let mut t = tracking();
    assert_eq!(
        TrackingService::approve(&mut t, UserId::new(), None, now()),
        Err(TrackingError::InvalidTransition {
            from: TrackingStatus::Expected,
            to: TrackingStatus::Approved,
        })
    );
}

#[test]
fn test_pay_requires_reference() {
    let mut t = in_status(TrackingStatus::Approved);
    assert_eq!(
        TrackingService::mark_paid(&mut t, "", None, now()),
        Err(TrackingError::RequiredField("Payment reference"))
    );
}

// ============================================================================
// projections
// ============================================================================

#[test]
fn test_missing_invoices_sorted_and_annotated() {
    let mut old = tracking();
    old.expected_date = now() - Duration::days(40);
    let mut recent = in_status(TrackingStatus::Missing);
    recent.expected_date = now() - Duration::days(9);
    let received = in_status(TrackingStatus::Received);
    let mut future = tracking();
    future.expected_date = now() + Duration::days(2);

    let missing = MissingInvoice::collect(vec![recent, future, received, old], 0, now());
    assert_eq!(missing.len(), 2);
    assert_eq!(missing[0].days_overdue, 40);
    assert_eq!(missing[0].severity, Severity::Critical);
    assert_eq!(missing[1].days_overdue, 9);
    assert_eq!(missing[1].severity, Severity::Medium);

    let filtered = MissingInvoice::collect(missing.into_iter().map(|m| m.tracking).collect(), 10, now());
    assert_eq!(filtered.len(), 1);
}

#[test]
fn test_approval_stats() {
    let mut a = tracking();
    TrackingService::mark_received(&mut a, receipt(eur(dec!(100))), now()).unwrap();
    TrackingService::approve(&mut a, UserId::new(), None, now() + Duration::days(2)).unwrap();

    let mut b = tracking();
    TrackingService::mark_received(&mut b, receipt(eur(dec!(50))), now()).unwrap();
    TrackingService::approve(&mut b, UserId::new(), None, now() + Duration::days(1)).unwrap();

    let mut c = tracking();
    TrackingService::mark_received(&mut c, receipt(eur(dec!(30))), now()).unwrap();

    let stats = ApprovalStats::compute(&[a.clone(), b, c, tracking()]);
    assert_eq!(stats.expected, 1);
    assert_eq!(stats.pending_approval, 1);
    assert_eq!(stats.approved, 2);
    assert_eq!(stats.approved_amounts.len(), 1);
    assert_eq!(stats.approved_amounts[0].total.amount, dec!(150));
    assert_eq!(stats.approved_amounts[0].count, 2);
    assert_eq!(stats.pending_amounts[0].total.amount, dec!(30));
    assert_eq!(stats.average_approval_days, Some(dec!(1.5)));

    let history = ApprovalRecord::history(&[a.clone(), tracking()]);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].tracking_id, a.id);
}
