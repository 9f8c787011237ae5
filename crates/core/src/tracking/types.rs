//! Tracking domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use freightbook_shared::types::{
    CurrencyAmount, InvoiceId, PartnerId, ShipmentId, TrackingId, UserId,
};

/// Lifecycle status of an expected incoming invoice.
///
/// The valid transitions are:
/// - Expected → Received (invoice arrives)
/// - Expected → Missing (reminder sent)
/// - Missing → Received (late invoice arrives)
/// - Received → Approved (approval)
/// - Approved → Paid (payment)
/// - any non-terminal → Disputed
/// - Disputed → Received | Cancelled (resolution)
/// - Expected | Missing | Received | Approved → Cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingStatus {
    /// Waiting for the partner's invoice.
    Expected,
    /// Invoice linked, waiting for approval.
    Received,
    /// Approved for payment.
    Approved,
    /// Paid (terminal).
    Paid,
    /// Past due, at least one reminder sent.
    Missing,
    /// Under dispute with the partner.
    Disputed,
    /// No invoice will be processed (terminal).
    Cancelled,
}

impl TrackingStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Expected,
        Self::Missing,
        Self::Received,
        Self::Approved,
        Self::Paid,
        Self::Disputed,
        Self::Cancelled,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Expected => "expected",
            Self::Received => "received",
            Self::Approved => "approved",
            Self::Paid => "paid",
            Self::Missing => "missing",
            Self::Disputed => "disputed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "expected" => Some(Self::Expected),
            "received" => Some(Self::Received),
            "approved" => Some(Self::Approved),
            "paid" => Some(Self::Paid),
            "missing" => Some(Self::Missing),
            "disputed" => Some(Self::Disputed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true for `paid` and `cancelled`.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }

    /// Returns true while the partner still owes the invoice document.
    #[must_use]
    pub const fn is_awaiting_invoice(&self) -> bool {
        matches!(self, Self::Expected | Self::Missing)
    }
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Expectation that a partner sends an invoice for a delivered shipment.
///
/// At most one live row exists per shipment. Rows are never physically deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingInvoiceTracking {
    /// Tracking ID.
    pub id: TrackingId,
    /// Shipment the invoice is expected for.
    pub shipment_id: ShipmentId,
    /// Partner expected to send the invoice.
    pub partner_id: PartnerId,
    /// When the invoice is expected.
    pub expected_date: DateTime<Utc>,
    /// Amount the invoice is expected to carry.
    pub expected_amount: Option<CurrencyAmount>,
    /// Linked incoming invoice, once received.
    pub invoice_id: Option<InvoiceId>,
    /// When the invoice arrived.
    pub received_date: Option<DateTime<Utc>>,
    /// Amount actually invoiced.
    pub actual_amount: Option<CurrencyAmount>,
    /// Lifecycle status.
    pub status: TrackingStatus,
    /// Number of reminders sent. Never decreases.
    pub reminders_sent: u32,
    /// When the last reminder was sent.
    pub last_reminder_date: Option<DateTime<Utc>>,
    /// Why the invoice is disputed.
    pub dispute_reason: Option<String>,
    /// When the dispute was opened.
    pub dispute_date: Option<DateTime<Utc>>,
    /// When the dispute was resolved.
    pub dispute_resolved_date: Option<DateTime<Utc>>,
    /// Approving user.
    pub approved_by: Option<UserId>,
    /// When the invoice was approved.
    pub approved_date: Option<DateTime<Utc>>,
    /// Approval notes.
    pub approval_notes: Option<String>,
    /// Payment reference.
    pub payment_reference: Option<String>,
    /// When the invoice was paid.
    pub paid_date: Option<DateTime<Utc>>,
    /// Append-only, newline separated, timestamped notes.
    pub internal_notes: String,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last changed.
    pub updated_at: DateTime<Utc>,
}

impl IncomingInvoiceTracking {
    /// Amount the partner is owed: the actual amount once known, else the expected one.
    #[must_use]
    pub fn amount_due(&self) -> Option<CurrencyAmount> {
        self.actual_amount.or(self.expected_amount)
    }
}

/// Input for creating a tracking row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTracking {
    /// Shipment the invoice is expected for.
    pub shipment_id: ShipmentId,
    /// Partner expected to send the invoice.
    pub partner_id: PartnerId,
    /// When the invoice is expected.
    pub expected_date: DateTime<Utc>,
    /// Amount the invoice is expected to carry.
    pub expected_amount: Option<CurrencyAmount>,
}

/// Receipt details for [`super::TrackingService::mark_received`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceReceipt {
    /// The incoming invoice that arrived.
    pub invoice_id: InvoiceId,
    /// The invoice's total, used when no actual amount is given.
    pub invoice_total: CurrencyAmount,
    /// When it arrived; defaults to now.
    pub received_date: Option<DateTime<Utc>>,
    /// Amount actually invoiced; defaults to the invoice total.
    pub actual_amount: Option<CurrencyAmount>,
}
