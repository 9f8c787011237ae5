//! Tracking repository for expected incoming invoices.
//!
//! Every mutation loads the row, runs the `TrackingService` transition, stores
//! the result and appends the audit event inside one database transaction.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use freightbook_core::audit::{AuditEntityType, AuditEntry, LedgerEvent};
use freightbook_core::batch::BatchReport;
use freightbook_core::tracking::{
    ApprovalRecord, ApprovalStats, BulkDecision, BulkPolicy, IncomingInvoiceTracking,
    InvoiceReceipt, MissingInvoice, NewTracking, ShipmentCandidate, TrackingError,
    TrackingFilter, TrackingService, TrackingStatus,
};
use freightbook_shared::SharedClock;
use freightbook_shared::clock::{from_millis, to_millis};
use freightbook_shared::types::{
    CurrencyAmount, InvoiceId, PageRequest, PageResponse, PartnerId, ShipmentId, TrackingId, UserId,
};

use crate::convert::{money, opt_money, tracking_active, tracking_from_model};
use crate::entities::{incoming_invoice_trackings, invoices, partners, shipments};
use crate::repositories::{RepositoryError, audit};

/// Shipment status that makes a shipment eligible for bulk tracking.
const DELIVERED: &str = "delivered";

/// Invoice direction of partner invoices.
const INCOMING: &str = "incoming";

/// Details supplied when a partner invoice arrives.
#[derive(Debug, Clone, Copy)]
pub struct ReceiveInvoiceInput {
    /// The incoming invoice.
    pub invoice_id: InvoiceId,
    /// When it arrived; defaults to now.
    pub received_date: Option<DateTime<Utc>>,
    /// Amount actually invoiced; defaults to the invoice total.
    pub actual_amount: Option<CurrencyAmount>,
}

/// Tracking repository.
#[derive(Debug, Clone)]
pub struct TrackingRepository {
    db: DatabaseConnection,
    clock: SharedClock,
}

impl TrackingRepository {
    /// Creates a new tracking repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, clock: SharedClock) -> Self {
        Self { db, clock }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Creates an `expected` tracking for a delivered shipment.
    ///
    /// # Errors
    ///
    /// - `ShipmentNotFound` / `PartnerNotFound` if either record is absent
    /// - `AlreadyTracked` if the shipment already has a tracking, including when
    ///   a concurrent insert wins the unique index
    /// - `NegativeAmount` for a negative expected amount
    pub async fn create(
        &self,
        input: NewTracking,
        actor: Option<UserId>,
    ) -> Result<IncomingInvoiceTracking, RepositoryError> {
        self.create_inner(input, actor, false).await
    }

    async fn create_inner(
        &self,
        input: NewTracking,
        actor: Option<UserId>,
        bulk: bool,
    ) -> Result<IncomingInvoiceTracking, RepositoryError> {
        let txn = self.db.begin().await?;
        let now = self.clock.now();

        let shipment_exists = shipments::Entity::find_by_id(input.shipment_id.into_inner())
            .filter(shipments::Column::DeletedAt.is_null())
            .count(&txn)
            .await?
            > 0;
        if !shipment_exists {
            return Err(TrackingError::ShipmentNotFound(input.shipment_id).into());
        }
        let partner_exists = partners::Entity::find_by_id(input.partner_id.into_inner())
            .filter(partners::Column::DeletedAt.is_null())
            .count(&txn)
            .await?
            > 0;
        if !partner_exists {
            return Err(TrackingError::PartnerNotFound(input.partner_id).into());
        }
        if Self::find_by_shipment(&txn, input.shipment_id).await?.is_some() {
            return Err(TrackingError::AlreadyTracked(input.shipment_id).into());
        }

        let shipment_id = input.shipment_id;
        let tracking = TrackingService::create(input, now)?;
        if let Err(err) = tracking_active(&tracking).insert(&txn).await {
            let err = RepositoryError::from(err);
            return Err(if err.is_unique_violation() {
                TrackingError::AlreadyTracked(shipment_id).into()
            } else {
                err
            });
        }
        Self::audit(
            &txn,
            &tracking,
            TrackingService::created_event(&tracking, bulk),
            actor,
            now,
        )
        .await?;
        txn.commit().await?;

        tracing::info!(
            tracking_id = %tracking.id,
            shipment_id = %tracking.shipment_id,
            partner_id = %tracking.partner_id,
            bulk,
            "Expected invoice tracking created"
        );
        Ok(tracking)
    }

    /// Links a received partner invoice.
    ///
    /// # Errors
    ///
    /// - `TrackingNotFound` if the tracking is absent
    /// - `InvoiceNotFound` unless the invoice exists and is an incoming one
    /// - `InvalidTransition` unless the tracking is `expected` or `missing`
    pub async fn mark_received(
        &self,
        id: TrackingId,
        input: ReceiveInvoiceInput,
        actor: Option<UserId>,
    ) -> Result<IncomingInvoiceTracking, RepositoryError> {
        let txn = self.db.begin().await?;
        let invoice = invoices::Entity::find_by_id(input.invoice_id.into_inner())
            .filter(invoices::Column::Direction.eq(INCOMING))
            .filter(invoices::Column::DeletedAt.is_null())
            .one(&txn)
            .await?
            .ok_or(TrackingError::InvoiceNotFound(input.invoice_id))?;
        let receipt = InvoiceReceipt {
            invoice_id: input.invoice_id,
            invoice_total: money(
                invoice.total_amount,
                &invoice.total_currency,
                invoice.total_exchange_rate,
            )?,
            received_date: input.received_date,
            actual_amount: input.actual_amount,
        };

        self.transition_in(txn, id, actor, |t, now| {
            TrackingService::mark_received(t, receipt, now).map(Some)
        })
        .await
    }

    /// Records a reminder sent to the partner.
    ///
    /// # Errors
    ///
    /// Returns `NotAllowed` for `paid` and `cancelled` trackings.
    pub async fn send_reminder(
        &self,
        id: TrackingId,
        notes: Option<String>,
        actor: Option<UserId>,
    ) -> Result<IncomingInvoiceTracking, RepositoryError> {
        self.transition(id, actor, |t, now| {
            TrackingService::send_reminder(t, notes.as_deref(), now).map(Some)
        })
        .await
    }

    /// Opens a dispute.
    ///
    /// # Errors
    ///
    /// - `RequiredField` for a blank reason
    /// - `NotAllowed` for terminal trackings
    pub async fn dispute(
        &self,
        id: TrackingId,
        reason: String,
        actor: Option<UserId>,
    ) -> Result<IncomingInvoiceTracking, RepositoryError> {
        self.transition(id, actor, |t, now| {
            TrackingService::dispute(t, &reason, now).map(Some)
        })
        .await
    }

    /// Resolves a dispute to `received` or `cancelled`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the tracking is `disputed`; nothing is stored.
    pub async fn resolve_dispute(
        &self,
        id: TrackingId,
        resolution: String,
        new_status: TrackingStatus,
        actor: Option<UserId>,
    ) -> Result<IncomingInvoiceTracking, RepositoryError> {
        self.transition(id, actor, |t, now| {
            TrackingService::resolve_dispute(t, &resolution, new_status, now).map(Some)
        })
        .await
    }

    /// Cancels a tracking. Cancelling a cancelled tracking is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `NotAllowed` for a paid tracking.
    pub async fn cancel(
        &self,
        id: TrackingId,
        reason: String,
        actor: Option<UserId>,
    ) -> Result<IncomingInvoiceTracking, RepositoryError> {
        self.transition(id, actor, |t, now| TrackingService::cancel(t, &reason, now))
            .await
    }

    /// Approves a received invoice.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the tracking is `received`.
    pub async fn approve(
        &self,
        id: TrackingId,
        approved_by: UserId,
        notes: Option<String>,
    ) -> Result<IncomingInvoiceTracking, RepositoryError> {
        self.transition(id, Some(approved_by), |t, now| {
            TrackingService::approve(t, approved_by, notes, now).map(Some)
        })
        .await
    }

    /// Records payment of an approved invoice.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the tracking is `approved`.
    pub async fn mark_paid(
        &self,
        id: TrackingId,
        payment_reference: String,
        paid_date: Option<DateTime<Utc>>,
        actor: Option<UserId>,
    ) -> Result<IncomingInvoiceTracking, RepositoryError> {
        self.transition(id, actor, |t, now| {
            TrackingService::mark_paid(t, &payment_reference, paid_date, now).map(Some)
        })
        .await
    }

    /// Creates trackings for every delivered shipment past the cutoff.
    ///
    /// Each shipment is its own transaction; failures are logged and reported
    /// per shipment without aborting the batch.
    ///
    /// # Errors
    ///
    /// Returns an error only if the candidate scan itself fails.
    pub async fn bulk_create(
        &self,
        policy: BulkPolicy,
    ) -> Result<BatchReport<ShipmentId, TrackingId>, RepositoryError> {
        let now = self.clock.now();
        let delivered = shipments::Entity::find()
            .filter(shipments::Column::Status.eq(DELIVERED))
            .filter(shipments::Column::DeletedAt.is_null())
            .filter(shipments::Column::DeliveredAt.lt(to_millis(policy.cutoff(now))))
            .order_by_asc(shipments::Column::DeliveredAt)
            .all(&self.db)
            .await?;
        let ids: Vec<Uuid> = delivered.iter().map(|s| s.id).collect();

        let tracked: HashSet<Uuid> = incoming_invoice_trackings::Entity::find()
            .select_only()
            .column(incoming_invoice_trackings::Column::ShipmentId)
            .filter(incoming_invoice_trackings::Column::ShipmentId.is_in(ids.clone()))
            .filter(incoming_invoice_trackings::Column::DeletedAt.is_null())
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();
        let invoiced: HashSet<Uuid> = invoices::Entity::find()
            .select_only()
            .column(invoices::Column::ShipmentId)
            .filter(invoices::Column::Direction.eq(INCOMING))
            .filter(invoices::Column::ShipmentId.is_in(ids))
            .filter(invoices::Column::DeletedAt.is_null())
            .into_tuple::<Option<Uuid>>()
            .all(&self.db)
            .await?
            .into_iter()
            .flatten()
            .collect();

        let mut report = BatchReport::new();
        for shipment in delivered {
            let key = ShipmentId::from_uuid(shipment.id);
            let Some(delivered_at) = shipment.delivered_at.map(from_millis) else {
                continue;
            };
            let agreed_cost = match opt_money(
                shipment.agreed_cost_amount,
                shipment.agreed_cost_currency.as_deref(),
                shipment.agreed_cost_exchange_rate,
            ) {
                Ok(cost) => cost,
                Err(err) => {
                    tracing::warn!(shipment_id = %key, error = %err, "Skipping corrupt shipment");
                    report.fail(key, err);
                    continue;
                }
            };
            let candidate = ShipmentCandidate {
                shipment_id: key,
                partner_id: shipment.partner_id.map(PartnerId::from_uuid),
                delivered_at,
                agreed_cost,
                has_tracking: tracked.contains(&shipment.id),
                has_incoming_invoice: invoiced.contains(&shipment.id),
            };

            match policy.decide(&candidate, now) {
                BulkDecision::Skip(reason) => report.skip(key, reason.as_str()),
                BulkDecision::Create(input) => {
                    let result = self.create_inner(input, None, true).await;
                    if let Err(err) = &result {
                        tracing::warn!(shipment_id = %key, error = %err, "Bulk tracking creation failed");
                    }
                    report.record(key, result.map(|t| t.id));
                }
            }
        }

        tracing::info!(
            created = report.succeeded,
            skipped = report.skipped,
            failed = report.failed,
            "Bulk expected invoice creation finished"
        );
        Ok(report)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Gets a tracking by ID.
    ///
    /// # Errors
    ///
    /// Returns `TrackingNotFound` if the tracking does not exist.
    pub async fn get(&self, id: TrackingId) -> Result<IncomingInvoiceTracking, RepositoryError> {
        Self::load(&self.db, id).await
    }

    /// Lists trackings, oldest expected date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(
        &self,
        filter: TrackingFilter,
        page: PageRequest,
    ) -> Result<PageResponse<IncomingInvoiceTracking>, RepositoryError> {
        let mut query = incoming_invoice_trackings::Entity::find()
            .filter(incoming_invoice_trackings::Column::DeletedAt.is_null());
        if let Some(status) = filter.status {
            query = query.filter(incoming_invoice_trackings::Column::Status.eq(status.as_str()));
        }
        if let Some(partner_id) = filter.partner_id {
            query = query
                .filter(incoming_invoice_trackings::Column::PartnerId.eq(partner_id.into_inner()));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_asc(incoming_invoice_trackings::Column::ExpectedDate)
            .order_by_asc(incoming_invoice_trackings::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        let data = rows
            .into_iter()
            .map(tracking_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(data, page, total))
    }

    /// Trackings still awaiting an invoice at least `min_days_overdue` days past
    /// their expected date, most overdue first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn missing(&self, min_days_overdue: i64) -> Result<Vec<MissingInvoice>, RepositoryError> {
        let now = self.clock.now();
        let rows = incoming_invoice_trackings::Entity::find()
            .filter(incoming_invoice_trackings::Column::DeletedAt.is_null())
            .filter(incoming_invoice_trackings::Column::Status.is_in([
                TrackingStatus::Expected.as_str(),
                TrackingStatus::Missing.as_str(),
            ]))
            .filter(incoming_invoice_trackings::Column::ExpectedDate.lt(to_millis(now)))
            .all(&self.db)
            .await?;
        let trackings = rows
            .into_iter()
            .map(tracking_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(MissingInvoice::collect(trackings, min_days_overdue, now))
    }

    /// Received invoices waiting for approval, oldest receipt first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn pending_approvals(&self) -> Result<Vec<IncomingInvoiceTracking>, RepositoryError> {
        self.by_status(
            TrackingStatus::Received,
            incoming_invoice_trackings::Column::ReceivedDate,
        )
        .await
    }

    /// Approved invoices waiting for payment, oldest approval first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn approved(&self) -> Result<Vec<IncomingInvoiceTracking>, RepositoryError> {
        self.by_status(
            TrackingStatus::Approved,
            incoming_invoice_trackings::Column::ApprovedDate,
        )
        .await
    }

    /// Approval history, newest approval first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn approval_history(
        &self,
        partner_id: Option<PartnerId>,
    ) -> Result<Vec<ApprovalRecord>, RepositoryError> {
        let mut query = incoming_invoice_trackings::Entity::find()
            .filter(incoming_invoice_trackings::Column::DeletedAt.is_null())
            .filter(incoming_invoice_trackings::Column::ApprovedBy.is_not_null());
        if let Some(partner_id) = partner_id {
            query = query
                .filter(incoming_invoice_trackings::Column::PartnerId.eq(partner_id.into_inner()));
        }
        let trackings = query
            .all(&self.db)
            .await?
            .into_iter()
            .map(tracking_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ApprovalRecord::history(&trackings))
    }

    /// Status counts, open amounts and average approval time.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn approval_stats(&self) -> Result<ApprovalStats, RepositoryError> {
        let trackings = incoming_invoice_trackings::Entity::find()
            .filter(incoming_invoice_trackings::Column::DeletedAt.is_null())
            .all(&self.db)
            .await?
            .into_iter()
            .map(tracking_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ApprovalStats::compute(&trackings))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Loads, transitions, stores and audits one tracking in one transaction.
    ///
    /// A transition returning `None` changed nothing and stores nothing.
    async fn transition<F>(
        &self,
        id: TrackingId,
        actor: Option<UserId>,
        apply: F,
    ) -> Result<IncomingInvoiceTracking, RepositoryError>
    where
        F: FnOnce(
            &mut IncomingInvoiceTracking,
            DateTime<Utc>,
        ) -> Result<Option<LedgerEvent>, TrackingError>,
    {
        let txn = self.db.begin().await?;
        self.transition_in(txn, id, actor, apply).await
    }

    async fn transition_in<F>(
        &self,
        txn: DatabaseTransaction,
        id: TrackingId,
        actor: Option<UserId>,
        apply: F,
    ) -> Result<IncomingInvoiceTracking, RepositoryError>
    where
        F: FnOnce(
            &mut IncomingInvoiceTracking,
            DateTime<Utc>,
        ) -> Result<Option<LedgerEvent>, TrackingError>,
    {
        let now = self.clock.now();
        let mut tracking = Self::load_for_update(&txn, id).await?;
        let from = tracking.status;

        let Some(event) = apply(&mut tracking, now)? else {
            txn.commit().await?;
            return Ok(tracking);
        };
        tracking_active(&tracking).update(&txn).await?;
        let event_name = event.name();
        Self::audit(&txn, &tracking, event, actor, now).await?;
        txn.commit().await?;

        tracing::info!(
            tracking_id = %id,
            from = %from,
            to = %tracking.status,
            event = event_name,
            "Tracking updated"
        );
        Ok(tracking)
    }

    /// Applies a reminder inside a caller's transaction.
    pub(crate) async fn send_reminder_in<C: ConnectionTrait>(
        conn: &C,
        tracking: &mut IncomingInvoiceTracking,
        notes: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let event = TrackingService::send_reminder(tracking, Some(notes), now)?;
        tracking_active(tracking).update(conn).await?;
        Self::audit(conn, tracking, event, None, now).await
    }

    pub(crate) async fn load<C: ConnectionTrait>(
        conn: &C,
        id: TrackingId,
    ) -> Result<IncomingInvoiceTracking, RepositoryError> {
        let model = incoming_invoice_trackings::Entity::find_by_id(id.into_inner())
            .filter(incoming_invoice_trackings::Column::DeletedAt.is_null())
            .one(conn)
            .await?
            .ok_or(TrackingError::TrackingNotFound(id))?;
        tracking_from_model(model)
    }

    pub(crate) async fn load_for_update<C: ConnectionTrait>(
        conn: &C,
        id: TrackingId,
    ) -> Result<IncomingInvoiceTracking, RepositoryError> {
        let model = incoming_invoice_trackings::Entity::find_by_id(id.into_inner())
            .filter(incoming_invoice_trackings::Column::DeletedAt.is_null())
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or(TrackingError::TrackingNotFound(id))?;
        tracking_from_model(model)
    }

    async fn find_by_shipment<C: ConnectionTrait>(
        conn: &C,
        shipment_id: ShipmentId,
    ) -> Result<Option<incoming_invoice_trackings::Model>, RepositoryError> {
        Ok(incoming_invoice_trackings::Entity::find()
            .filter(incoming_invoice_trackings::Column::ShipmentId.eq(shipment_id.into_inner()))
            .filter(incoming_invoice_trackings::Column::DeletedAt.is_null())
            .one(conn)
            .await?)
    }

    async fn by_status(
        &self,
        status: TrackingStatus,
        order: incoming_invoice_trackings::Column,
    ) -> Result<Vec<IncomingInvoiceTracking>, RepositoryError> {
        incoming_invoice_trackings::Entity::find()
            .filter(incoming_invoice_trackings::Column::DeletedAt.is_null())
            .filter(incoming_invoice_trackings::Column::Status.eq(status.as_str()))
            .order_by_asc(order)
            .order_by_asc(incoming_invoice_trackings::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(tracking_from_model)
            .collect()
    }

    async fn audit<C: ConnectionTrait>(
        conn: &C,
        tracking: &IncomingInvoiceTracking,
        event: LedgerEvent,
        actor: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let entry = AuditEntry::new(
            AuditEntityType::Tracking,
            tracking.id.into_inner(),
            event,
            actor,
            now,
        );
        audit::record(conn, &entry).await
    }
}
