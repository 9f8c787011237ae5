//! Typed audit events for the receivables engine.
//!
//! Every mutation produces exactly one [`LedgerEvent`]. The `db` crate wraps it
//! in an [`AuditEntry`] and writes it in the same transaction as the change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use freightbook_shared::types::{
    CurrencyAmount, CustomerId, InvoiceId, PartnerId, ShipmentId, UserId,
};

use crate::dunning::{DunningLevel, Party};
use crate::statement::ExportFormat;
use crate::tracking::TrackingStatus;

/// Kind of record an audit entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEntityType {
    /// Incoming invoice tracking row.
    Tracking,
    /// Outgoing invoice owned by the billing module.
    Invoice,
    /// Statement of accounts snapshot.
    Statement,
    /// Per-party dunning configuration.
    DunningConfig,
}

impl AuditEntityType {
    /// Returns the string representation stored in the audit log.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tracking => "tracking",
            Self::Invoice => "invoice",
            Self::Statement => "statement",
            Self::DunningConfig => "dunning_config",
        }
    }
}

impl fmt::Display for AuditEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload of an audit entry, one variant per operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A tracking row was created for a delivered shipment.
    TrackingCreated {
        /// Shipment the invoice is expected for.
        shipment_id: ShipmentId,
        /// Partner expected to send the invoice.
        partner_id: PartnerId,
        /// When the invoice is expected.
        expected_date: DateTime<Utc>,
        /// Amount the invoice is expected to carry.
        expected_amount: Option<CurrencyAmount>,
        /// True when created by the bulk scan.
        bulk: bool,
    },
    /// The partner invoice arrived and was linked.
    InvoiceReceived {
        /// Linked incoming invoice.
        invoice_id: InvoiceId,
        /// When it arrived.
        received_date: DateTime<Utc>,
        /// Amount actually invoiced.
        actual_amount: CurrencyAmount,
    },
    /// A reminder was sent to the partner.
    ReminderSent {
        /// Reminder counter after this reminder.
        reminders_sent: u32,
        /// Status after the reminder.
        status: TrackingStatus,
    },
    /// The invoice was disputed.
    Disputed {
        /// Why the invoice is disputed.
        reason: String,
        /// Status before the dispute.
        previous_status: TrackingStatus,
    },
    /// A dispute was resolved.
    DisputeResolved {
        /// Resolution note.
        resolution: String,
        /// Status after resolution.
        new_status: TrackingStatus,
    },
    /// The expected invoice was cancelled.
    Cancelled {
        /// Cancellation reason.
        reason: String,
        /// Status before cancellation.
        previous_status: TrackingStatus,
    },
    /// The received invoice was approved for payment.
    Approved {
        /// Approving user.
        approved_by: UserId,
        /// Optional approval notes.
        notes: Option<String>,
    },
    /// The approved invoice was paid.
    Paid {
        /// Payment reference.
        payment_reference: String,
        /// When it was paid.
        paid_date: DateTime<Utc>,
    },
    /// A statement snapshot was generated.
    StatementGenerated {
        /// Customer the statement belongs to.
        customer_id: CustomerId,
        /// Period start.
        start_date: DateTime<Utc>,
        /// Period end.
        end_date: DateTime<Utc>,
        /// Closing balance of the snapshot.
        closing_balance: CurrencyAmount,
    },
    /// A statement snapshot was invalidated for regeneration.
    StatementInvalidated {
        /// Customer the statement belongs to.
        customer_id: CustomerId,
    },
    /// A statement snapshot was exported.
    StatementExported {
        /// Export format.
        format: ExportFormat,
    },
    /// A statement snapshot was sent to the customer.
    StatementSent {
        /// Recipient address.
        recipient: String,
    },
    /// A statement snapshot was deleted.
    StatementDeleted,
    /// A debt reached a higher dunning level.
    DunningEscalated {
        /// Level before this evaluation.
        previous_level: DunningLevel,
        /// Level reached.
        level: DunningLevel,
        /// Days overdue at evaluation time.
        days_overdue: i64,
        /// Fee charged for the new level, if any.
        fee: Option<CurrencyAmount>,
    },
    /// An automatic reminder was handed to notification delivery.
    ReminderDispatched {
        /// Level the reminder belongs to.
        level: DunningLevel,
    },
    /// Service to a party was suspended.
    ServiceSuspended {
        /// Suspended party.
        party: Party,
    },
    /// Service to a party was reactivated after payment.
    ServiceReactivated {
        /// Reactivated party.
        party: Party,
    },
    /// A party's dunning configuration was created or replaced.
    DunningConfigUpdated {
        /// Owning party.
        party: Party,
    },
}

impl LedgerEvent {
    /// Returns the event name stored alongside the payload.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TrackingCreated { .. } => "tracking_created",
            Self::InvoiceReceived { .. } => "invoice_received",
            Self::ReminderSent { .. } => "reminder_sent",
            Self::Disputed { .. } => "disputed",
            Self::DisputeResolved { .. } => "dispute_resolved",
            Self::Cancelled { .. } => "cancelled",
            Self::Approved { .. } => "approved",
            Self::Paid { .. } => "paid",
            Self::StatementGenerated { .. } => "statement_generated",
            Self::StatementInvalidated { .. } => "statement_invalidated",
            Self::StatementExported { .. } => "statement_exported",
            Self::StatementSent { .. } => "statement_sent",
            Self::StatementDeleted => "statement_deleted",
            Self::DunningEscalated { .. } => "dunning_escalated",
            Self::ReminderDispatched { .. } => "reminder_dispatched",
            Self::ServiceSuspended { .. } => "service_suspended",
            Self::ServiceReactivated { .. } => "service_reactivated",
            Self::DunningConfigUpdated { .. } => "dunning_config_updated",
        }
    }
}

/// A write-only audit log row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// Kind of the affected record.
    pub entity_type: AuditEntityType,
    /// ID of the affected record.
    pub entity_id: Uuid,
    /// What happened.
    pub event: LedgerEvent,
    /// User who triggered the change, `None` for scheduled jobs.
    pub actor_id: Option<UserId>,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an entry for `event` on the given record.
    #[must_use]
    pub fn new(
        entity_type: AuditEntityType,
        entity_id: Uuid,
        event: LedgerEvent,
        actor_id: Option<UserId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entity_type,
            entity_id,
            event,
            actor_id,
            created_at,
        }
    }

    /// Serializes the event payload for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn payload(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(&self.event)
    }
}
