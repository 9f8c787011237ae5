//! Property-based tests for TrackingService.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use freightbook_shared::types::{
    Currency, CurrencyAmount, InvoiceId, PartnerId, ShipmentId, UserId,
};

use crate::tracking::service::TrackingService;
use crate::tracking::types::{
    IncomingInvoiceTracking, InvoiceReceipt, NewTracking, TrackingStatus,
};

#[derive(Debug, Clone)]
enum Op {
    Receive,
    Remind,
    Dispute,
    Resolve(TrackingStatus),
    Cancel,
    Approve,
    Pay,
}

fn arb_status() -> impl Strategy<Value = TrackingStatus> {
    prop::sample::select(TrackingStatus::ALL.to_vec())
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Receive),
        Just(Op::Remind),
        Just(Op::Dispute),
        arb_status().prop_map(Op::Resolve),
        Just(Op::Cancel),
        Just(Op::Approve),
        Just(Op::Pay),
    ]
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
}

fn fresh() -> IncomingInvoiceTracking {
    TrackingService::create(
        NewTracking {
            shipment_id: ShipmentId::new(),
            partner_id: PartnerId::new(),
            expected_date: start(),
            expected_amount: Some(CurrencyAmount::new(Decimal::from(120), Currency::Eur)),
        },
        start(),
    )
    .unwrap()
}

fn apply(t: &mut IncomingInvoiceTracking, op: &Op, now: DateTime<Utc>) -> bool {
    match op {
        Op::Receive => TrackingService::mark_received(
            t,
            InvoiceReceipt {
                invoice_id: InvoiceId::new(),
                invoice_total: CurrencyAmount::new(Decimal::from(118), Currency::Eur),
                received_date: None,
                actual_amount: None,
            },
            now,
        )
        .is_ok(),
        Op::Remind => TrackingService::send_reminder(t, None, now).is_ok(),
        Op::Dispute => TrackingService::dispute(t, "amount differs", now).is_ok(),
        Op::Resolve(status) => {
            TrackingService::resolve_dispute(t, "settled", *status, now).is_ok()
        }
        Op::Cancel => TrackingService::cancel(t, "not needed", now).is_ok(),
        Op::Approve => TrackingService::approve(t, UserId::new(), None, now).is_ok(),
        Op::Pay => TrackingService::mark_paid(t, "REF-1", None, now).is_ok(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Failed operations leave the tracking untouched; successful ones follow the lifecycle.
    #[test]
    fn prop_operations_respect_lifecycle(ops in prop::collection::vec(arb_op(), 1..25)) {
        let mut t = fresh();
        for (i, op) in ops.iter().enumerate() {
            let now = start() + Duration::hours(i64::try_from(i).unwrap_or(0));
            let before = t.clone();
            let ok = apply(&mut t, op, now);
            if ok {
                prop_assert!(
                    before.status == t.status
                        || TrackingService::can_transition(before.status, t.status),
                    "illegal transition {} -> {} via {:?}", before.status, t.status, op
                );
            } else {
                prop_assert_eq!(&before, &t);
            }
            prop_assert!(t.reminders_sent >= before.reminders_sent);
            if before.status.is_terminal() {
                prop_assert_eq!(before.status, t.status);
            }
        }
    }

    /// Each successful reminder adds exactly one note line.
    #[test]
    fn prop_reminders_counted(count in 1u32..10) {
        let mut t = fresh();
        for i in 0..count {
            let now = start() + Duration::days(i64::from(i));
            TrackingService::send_reminder(&mut t, None, now).unwrap();
        }
        prop_assert_eq!(t.reminders_sent, count);
        prop_assert_eq!(t.status, TrackingStatus::Missing);
        prop_assert_eq!(t.internal_notes.lines().count(), usize::try_from(count).unwrap());
    }
}
