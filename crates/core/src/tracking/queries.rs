//! Read-side projections over tracking rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use freightbook_shared::clock::{MILLIS_PER_DAY, floor_days_between};
use freightbook_shared::types::{
    CurrencyAmount, InvoiceId, PartnerId, ShipmentId, TrackingId, UserId,
};

use crate::dunning::Severity;
use crate::tracking::types::{IncomingInvoiceTracking, TrackingStatus};

/// Filter for listing trackings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingFilter {
    /// Only trackings in this status.
    pub status: Option<TrackingStatus>,
    /// Only trackings for this partner.
    pub partner_id: Option<PartnerId>,
}

/// A tracking past its expected date, annotated for follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingInvoice {
    /// The tracking row.
    #[serde(flatten)]
    pub tracking: IncomingInvoiceTracking,
    /// Whole days past the expected date.
    pub days_overdue: i64,
    /// Display severity.
    pub severity: Severity,
}

impl MissingInvoice {
    /// Annotates trackings still awaiting an invoice and at least
    /// `min_days_overdue` days past their expected date, most overdue first.
    #[must_use]
    pub fn collect(
        trackings: Vec<IncomingInvoiceTracking>,
        min_days_overdue: i64,
        now: DateTime<Utc>,
    ) -> Vec<Self> {
        let mut missing: Vec<Self> = trackings
            .into_iter()
            .filter(|t| t.status.is_awaiting_invoice())
            .filter_map(|tracking| {
                let days_overdue = floor_days_between(tracking.expected_date, now);
                (days_overdue > 0 && days_overdue >= min_days_overdue).then(|| Self {
                    severity: Severity::for_days_overdue(days_overdue),
                    days_overdue,
                    tracking,
                })
            })
            .collect();
        missing.sort_by(|a, b| {
            b.days_overdue
                .cmp(&a.days_overdue)
                .then_with(|| a.tracking.id.cmp(&b.tracking.id))
        });
        missing
    }
}

/// One approval decision, newest first in history listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRecord {
    /// Tracking ID.
    pub tracking_id: TrackingId,
    /// Shipment ID.
    pub shipment_id: ShipmentId,
    /// Partner ID.
    pub partner_id: PartnerId,
    /// Approved incoming invoice.
    pub invoice_id: Option<InvoiceId>,
    /// Approved amount.
    pub amount: Option<CurrencyAmount>,
    /// Approving user.
    pub approved_by: UserId,
    /// When approved.
    pub approved_date: DateTime<Utc>,
    /// Approval notes.
    pub approval_notes: Option<String>,
    /// Current status (`approved` or `paid`).
    pub status: TrackingStatus,
    /// When paid, if already paid.
    pub paid_date: Option<DateTime<Utc>>,
}

impl ApprovalRecord {
    /// Builds the approval history from approved trackings, newest approval first.
    #[must_use]
    pub fn history(trackings: &[IncomingInvoiceTracking]) -> Vec<Self> {
        let mut records: Vec<Self> = trackings
            .iter()
            .filter_map(|t| {
                Some(Self {
                    tracking_id: t.id,
                    shipment_id: t.shipment_id,
                    partner_id: t.partner_id,
                    invoice_id: t.invoice_id,
                    amount: t.amount_due(),
                    approved_by: t.approved_by?,
                    approved_date: t.approved_date?,
                    approval_notes: t.approval_notes.clone(),
                    status: t.status,
                    paid_date: t.paid_date,
                })
            })
            .collect();
        records.sort_by(|a, b| b.approved_date.cmp(&a.approved_date));
        records
    }
}

/// Per-currency total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyTotal {
    /// Total amount.
    #[serde(flatten)]
    pub total: CurrencyAmount,
    /// Number of trackings contributing.
    pub count: u64,
}

fn add_total(totals: &mut Vec<CurrencyTotal>, amount: CurrencyAmount) {
    if let Some(entry) = totals
        .iter_mut()
        .find(|t| t.total.currency == amount.currency)
    {
        entry.total.amount += amount.amount;
        entry.count += 1;
    } else {
        totals.push(CurrencyTotal {
            total: CurrencyAmount::new(amount.amount, amount.currency),
            count: 1,
        });
    }
}

/// Counts by status and approval throughput.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalStats {
    /// Trackings awaiting an invoice.
    pub expected: u64,
    /// Trackings with reminders outstanding.
    pub missing: u64,
    /// Received invoices waiting for approval.
    pub pending_approval: u64,
    /// Approved, not yet paid.
    pub approved: u64,
    /// Paid.
    pub paid: u64,
    /// Under dispute.
    pub disputed: u64,
    /// Cancelled.
    pub cancelled: u64,
    /// Amounts waiting for approval, per currency.
    pub pending_amounts: Vec<CurrencyTotal>,
    /// Amounts approved but unpaid, per currency.
    pub approved_amounts: Vec<CurrencyTotal>,
    /// Mean days from receipt to approval, one decimal place.
    pub average_approval_days: Option<Decimal>,
}

impl ApprovalStats {
    /// Computes statistics over a set of trackings.
    #[must_use]
    pub fn compute(trackings: &[IncomingInvoiceTracking]) -> Self {
        let mut stats = Self::default();
        let mut approval_millis: i64 = 0;
        let mut approval_count: i64 = 0;

        for tracking in trackings {
            match tracking.status {
                TrackingStatus::Expected => stats.expected += 1,
                TrackingStatus::Missing => stats.missing += 1,
                TrackingStatus::Received => {
                    stats.pending_approval += 1;
                    if let Some(amount) = tracking.amount_due() {
                        add_total(&mut stats.pending_amounts, amount);
                    }
                }
                TrackingStatus::Approved => {
                    stats.approved += 1;
                    if let Some(amount) = tracking.amount_due() {
                        add_total(&mut stats.approved_amounts, amount);
                    }
                }
                TrackingStatus::Paid => stats.paid += 1,
                TrackingStatus::Disputed => stats.disputed += 1,
                TrackingStatus::Cancelled => stats.cancelled += 1,
            }

            if let (Some(received), Some(approved)) = (tracking.received_date, tracking.approved_date)
            {
                approval_millis += (approved - received).num_milliseconds();
                approval_count += 1;
            }
        }

        if approval_count > 0 {
            let mean = Decimal::from(approval_millis)
                / Decimal::from(approval_count)
                / Decimal::from(MILLIS_PER_DAY);
            stats.average_approval_days = Some(mean.round_dp(1));
        }

        stats
    }
}
