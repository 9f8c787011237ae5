//! Tracking service for incoming-invoice state transitions.
//!
//! Every operation validates first and mutates second: when an error is
//! returned the tracking is untouched.

use chrono::{DateTime, SecondsFormat, Utc};

use freightbook_shared::types::{TrackingId, UserId};

use crate::audit::LedgerEvent;
use crate::tracking::error::TrackingError;
use crate::tracking::types::{
    IncomingInvoiceTracking, InvoiceReceipt, NewTracking, TrackingStatus,
};

/// Stateless service for managing tracking transitions.
pub struct TrackingService;

impl TrackingService {
    /// Returns true if `from → to` is a lifecycle transition.
    #[must_use]
    pub const fn can_transition(from: TrackingStatus, to: TrackingStatus) -> bool {
        use TrackingStatus::{Approved, Cancelled, Disputed, Expected, Missing, Paid, Received};
        matches!(
            (from, to),
            (Expected | Missing | Disputed, Received)
                | (Expected, Missing)
                | (Received, Approved)
                | (Approved, Paid)
                | (Expected | Missing | Received | Approved, Disputed)
                | (Expected | Missing | Received | Approved | Disputed, Cancelled)
        )
    }

    /// Builds a new `expected` tracking row.
    ///
    /// # Errors
    ///
    /// Returns `NegativeAmount` if the expected amount is below zero.
    pub fn create(
        input: NewTracking,
        now: DateTime<Utc>,
    ) -> Result<IncomingInvoiceTracking, TrackingError> {
        if input.expected_amount.is_some_and(|a| a.is_negative()) {
            return Err(TrackingError::NegativeAmount);
        }

        Ok(IncomingInvoiceTracking {
            id: TrackingId::new(),
            shipment_id: input.shipment_id,
            partner_id: input.partner_id,
            expected_date: input.expected_date,
            expected_amount: input.expected_amount.map(|a| a.rounded()),
            invoice_id: None,
            received_date: None,
            actual_amount: None,
            status: TrackingStatus::Expected,
            reminders_sent: 0,
            last_reminder_date: None,
            dispute_reason: None,
            dispute_date: None,
            dispute_resolved_date: None,
            approved_by: None,
            approved_date: None,
            approval_notes: None,
            payment_reference: None,
            paid_date: None,
            internal_notes: String::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Audit event for a freshly created tracking.
    #[must_use]
    pub fn created_event(tracking: &IncomingInvoiceTracking, bulk: bool) -> LedgerEvent {
        LedgerEvent::TrackingCreated {
            shipment_id: tracking.shipment_id,
            partner_id: tracking.partner_id,
            expected_date: tracking.expected_date,
            expected_amount: tracking.expected_amount,
            bulk,
        }
    }

    /// Links the partner invoice and moves to `received`.
    ///
    /// `actual_amount` defaults to the invoice total and `received_date` to `now`.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` unless the tracking is `expected` or `missing`
    /// - `NegativeAmount` if the actual amount is below zero
    pub fn mark_received(
        tracking: &mut IncomingInvoiceTracking,
        receipt: InvoiceReceipt,
        now: DateTime<Utc>,
    ) -> Result<LedgerEvent, TrackingError> {
        if !tracking.status.is_awaiting_invoice() {
            return Err(TrackingError::InvalidTransition {
                from: tracking.status,
                to: TrackingStatus::Received,
            });
        }
        let actual_amount = receipt
            .actual_amount
            .unwrap_or(receipt.invoice_total)
            .rounded();
        if actual_amount.is_negative() {
            return Err(TrackingError::NegativeAmount);
        }
        let received_date = receipt.received_date.unwrap_or(now);

        tracking.status = TrackingStatus::Received;
        tracking.invoice_id = Some(receipt.invoice_id);
        tracking.received_date = Some(received_date);
        tracking.actual_amount = Some(actual_amount);
        Self::append_note(
            tracking,
            now,
            &format!("Invoice {} received ({actual_amount})", receipt.invoice_id),
        );

        Ok(LedgerEvent::InvoiceReceived {
            invoice_id: receipt.invoice_id,
            received_date,
            actual_amount,
        })
    }

    /// Records a reminder to the partner.
    ///
    /// Increments `reminders_sent`, sets `last_reminder_date` and moves
    /// `expected` to `missing`. Other non-terminal statuses keep their status.
    ///
    /// # Errors
    ///
    /// Returns `NotAllowed` for `paid` and `cancelled` trackings.
    pub fn send_reminder(
        tracking: &mut IncomingInvoiceTracking,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<LedgerEvent, TrackingError> {
        if tracking.status.is_terminal() {
            return Err(TrackingError::NotAllowed {
                action: "send a reminder for",
                status: tracking.status,
            });
        }

        tracking.reminders_sent += 1;
        tracking.last_reminder_date = Some(now);
        if tracking.status == TrackingStatus::Expected {
            tracking.status = TrackingStatus::Missing;
        }
        let note = match notes.map(str::trim).filter(|n| !n.is_empty()) {
            Some(text) => format!("Reminder #{} sent: {text}", tracking.reminders_sent),
            None => format!("Reminder #{} sent", tracking.reminders_sent),
        };
        Self::append_note(tracking, now, &note);

        Ok(LedgerEvent::ReminderSent {
            reminders_sent: tracking.reminders_sent,
            status: tracking.status,
        })
    }

    /// Opens a dispute, or replaces the reason of an open one.
    ///
    /// # Errors
    ///
    /// - `RequiredField` if `reason` is blank
    /// - `NotAllowed` for terminal trackings
    pub fn dispute(
        tracking: &mut IncomingInvoiceTracking,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<LedgerEvent, TrackingError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(TrackingError::RequiredField("Dispute reason"));
        }
        if tracking.status.is_terminal() {
            return Err(TrackingError::NotAllowed {
                action: "dispute",
                status: tracking.status,
            });
        }
        if tracking.status != TrackingStatus::Disputed {
            Self::ensure_transition(tracking.status, TrackingStatus::Disputed)?;
        }

        let previous_status = tracking.status;
        tracking.status = TrackingStatus::Disputed;
        tracking.dispute_reason = Some(reason.to_string());
        tracking.dispute_date = Some(now);
        tracking.dispute_resolved_date = None;
        Self::append_note(tracking, now, &format!("Disputed: {reason}"));

        Ok(LedgerEvent::Disputed {
            reason: reason.to_string(),
            previous_status,
        })
    }

    /// Resolves an open dispute to `received` or `cancelled`.
    ///
    /// # Errors
    ///
    /// - `InvalidResolution` unless `new_status` is `received` or `cancelled`
    /// - `InvalidTransition` unless the tracking is `disputed`
    /// - `RequiredField` if `resolution` is blank
    pub fn resolve_dispute(
        tracking: &mut IncomingInvoiceTracking,
        resolution: &str,
        new_status: TrackingStatus,
        now: DateTime<Utc>,
    ) -> Result<LedgerEvent, TrackingError> {
        if !matches!(
            new_status,
            TrackingStatus::Received | TrackingStatus::Cancelled
        ) {
            return Err(TrackingError::InvalidResolution(new_status));
        }
        if tracking.status != TrackingStatus::Disputed {
            return Err(TrackingError::InvalidTransition {
                from: tracking.status,
                to: new_status,
            });
        }
        let resolution = resolution.trim();
        if resolution.is_empty() {
            return Err(TrackingError::RequiredField("Resolution"));
        }

        tracking.status = new_status;
        tracking.dispute_resolved_date = Some(now);
        Self::append_note(
            tracking,
            now,
            &format!("Dispute resolved ({new_status}): {resolution}"),
        );

        Ok(LedgerEvent::DisputeResolved {
            resolution: resolution.to_string(),
            new_status,
        })
    }

    /// Cancels the expected invoice.
    ///
    /// Cancelling an already cancelled tracking is a no-op and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// - `RequiredField` if `reason` is blank
    /// - `NotAllowed` for `paid` trackings
    pub fn cancel(
        tracking: &mut IncomingInvoiceTracking,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<LedgerEvent>, TrackingError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(TrackingError::RequiredField("Cancellation reason"));
        }
        match tracking.status {
            TrackingStatus::Cancelled => return Ok(None),
            TrackingStatus::Paid => {
                return Err(TrackingError::NotAllowed {
                    action: "cancel",
                    status: tracking.status,
                });
            }
            _ => {}
        }

        let previous_status = tracking.status;
        tracking.status = TrackingStatus::Cancelled;
        Self::append_note(tracking, now, &format!("Cancelled: {reason}"));

        Ok(Some(LedgerEvent::Cancelled {
            reason: reason.to_string(),
            previous_status,
        }))
    }

    /// Approves a received invoice for payment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the tracking is `received`.
    pub fn approve(
        tracking: &mut IncomingInvoiceTracking,
        approved_by: UserId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<LedgerEvent, TrackingError> {
        Self::ensure_from(tracking.status, TrackingStatus::Received, TrackingStatus::Approved)?;
        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        tracking.status = TrackingStatus::Approved;
        tracking.approved_by = Some(approved_by);
        tracking.approved_date = Some(now);
        tracking.approval_notes.clone_from(&notes);
        Self::append_note(tracking, now, &format!("Approved by {approved_by}"));

        Ok(LedgerEvent::Approved { approved_by, notes })
    }

    /// Records payment of an approved invoice.
    ///
    /// # Errors
    ///
    /// - `RequiredField` if `payment_reference` is blank
    /// - `InvalidTransition` unless the tracking is `approved`
    pub fn mark_paid(
        tracking: &mut IncomingInvoiceTracking,
        payment_reference: &str,
        paid_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<LedgerEvent, TrackingError> {
        let payment_reference = payment_reference.trim();
        if payment_reference.is_empty() {
            return Err(TrackingError::RequiredField("Payment reference"));
        }
        Self::ensure_from(tracking.status, TrackingStatus::Approved, TrackingStatus::Paid)?;
        let paid_date = paid_date.unwrap_or(now);

        tracking.status = TrackingStatus::Paid;
        tracking.payment_reference = Some(payment_reference.to_string());
        tracking.paid_date = Some(paid_date);
        Self::append_note(tracking, now, &format!("Paid: {payment_reference}"));

        Ok(LedgerEvent::Paid {
            payment_reference: payment_reference.to_string(),
            paid_date,
        })
    }

    /// Appends a `[timestamp] text` line to the internal notes and bumps `updated_at`.
    pub fn append_note(tracking: &mut IncomingInvoiceTracking, now: DateTime<Utc>, text: &str) {
        if !tracking.internal_notes.is_empty() {
            tracking.internal_notes.push('\n');
        }
        tracking.internal_notes.push('[');
        tracking
            .internal_notes
            .push_str(&now.to_rfc3339_opts(SecondsFormat::Secs, true));
        tracking.internal_notes.push_str("] ");
        tracking.internal_notes.push_str(text);
        tracking.updated_at = now;
    }

    fn ensure_transition(from: TrackingStatus, to: TrackingStatus) -> Result<(), TrackingError> {
        if Self::can_transition(from, to) {
            Ok(())
        } else {
            Err(TrackingError::InvalidTransition { from, to })
        }
    }

    fn ensure_from(
        current: TrackingStatus,
        required: TrackingStatus,
        to: TrackingStatus,
    ) -> Result<(), TrackingError> {
        if current == required {
            Ok(())
        } else {
            Err(TrackingError::InvalidTransition { from: current, to })
        }
    }
}
