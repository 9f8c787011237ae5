//! Dunning repository.
//!
//! Each evaluation reads the debt, the party's configuration and the debt's
//! dunning state, and persists the decision inside one `REPEATABLE READ`
//! transaction.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IsolationLevel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use freightbook_core::audit::{AuditEntityType, AuditEntry, LedgerEvent};
use freightbook_core::batch::BatchReport;
use freightbook_core::dunning::{
    DebtRef, DebtSnapshot, DunningConfig, DunningDecision, DunningEngine, DunningError,
    DunningPolicy, DunningState, Party,
};
use freightbook_core::statement::InvoiceStatus;
use freightbook_core::tracking::TrackingStatus;
use freightbook_shared::SharedClock;
use freightbook_shared::clock::{from_millis, to_millis};
use freightbook_shared::types::{
    Currency, CustomerId, DunningConfigId, InvoiceId, TrackingId, UserId,
};

use crate::convert::{
    dunning_config_active, dunning_config_from_model, dunning_state_active,
    dunning_state_from_model,
};
use crate::entities::{
    customers, dunning_configs, dunning_states, incoming_invoice_trackings, invoices, partners,
};
use crate::repositories::{RepositoryError, TrackingRepository, audit};

/// Dunning repository.
#[derive(Debug, Clone)]
pub struct DunningRepository {
    db: DatabaseConnection,
    clock: SharedClock,
    defaults: DunningPolicy,
}

impl DunningRepository {
    /// Creates a new dunning repository; `defaults` applies to parties without an override.
    #[must_use]
    pub const fn new(db: DatabaseConnection, clock: SharedClock, defaults: DunningPolicy) -> Self {
        Self {
            db,
            clock,
            defaults,
        }
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Evaluates an expected incoming invoice against its partner's policy.
    ///
    /// Trackings no longer awaiting an invoice evaluate to level 0. When the
    /// level advances with auto-send on, a reminder is recorded on the tracking
    /// in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `TrackingNotFound` if the tracking does not exist.
    pub async fn evaluate_tracking(
        &self,
        id: TrackingId,
    ) -> Result<DunningDecision, RepositoryError> {
        let txn = self.begin_snapshot().await?;
        let now = self.clock.now();

        let mut tracking = TrackingRepository::load_for_update(&txn, id)
            .await
            .map_err(|err| match err {
                RepositoryError::Tracking(_) => DunningError::TrackingNotFound(id).into(),
                other => other,
            })?;
        let snapshot = DebtSnapshot {
            debt: DebtRef::Tracking(id),
            party: Party::Partner(tracking.partner_id),
            reference_date: tracking.expected_date,
            settled: !tracking.status.is_awaiting_invoice(),
        };

        let decision = self.decide(&txn, &snapshot, now).await?;
        if decision.send_reminder {
            let note = format!("Dunning level {} reminder", decision.level.as_u8());
            TrackingRepository::send_reminder_in(&txn, &mut tracking, &note, now).await?;
        }
        txn.commit().await?;

        Self::log_decision(&decision);
        Ok(decision)
    }

    /// Evaluates an outgoing invoice against its customer's policy.
    ///
    /// Paid and cancelled invoices evaluate to level 0. When the level advances
    /// with auto-send on, a `reminder_dispatched` audit event is recorded.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound` if the invoice does not exist.
    pub async fn evaluate_invoice(
        &self,
        id: InvoiceId,
    ) -> Result<DunningDecision, RepositoryError> {
        let txn = self.begin_snapshot().await?;
        let now = self.clock.now();

        let invoice = invoices::Entity::find_by_id(id.into_inner())
            .filter(invoices::Column::DeletedAt.is_null())
            .one(&txn)
            .await?
            .ok_or(DunningError::InvoiceNotFound(id))?;
        let customer_id = invoice
            .customer_id
            .map(CustomerId::from_uuid)
            .ok_or_else(|| RepositoryError::corrupt(format!("invoice {id} has no customer")))?;
        let status = InvoiceStatus::parse(&invoice.status)
            .ok_or_else(|| RepositoryError::corrupt(format!("invoice status '{}'", invoice.status)))?;
        let snapshot = DebtSnapshot {
            debt: DebtRef::Invoice(id),
            party: Party::Customer(customer_id),
            reference_date: from_millis(invoice.due_date),
            settled: matches!(status, InvoiceStatus::Paid | InvoiceStatus::Cancelled),
        };

        let decision = self.decide(&txn, &snapshot, now).await?;
        if decision.send_reminder {
            let entry = AuditEntry::new(
                AuditEntityType::Invoice,
                id.into_inner(),
                LedgerEvent::ReminderDispatched {
                    level: decision.level,
                },
                None,
                now,
            );
            audit::record(&txn, &entry).await?;
        }
        txn.commit().await?;

        Self::log_decision(&decision);
        Ok(decision)
    }

    /// Evaluates every open tracking and every overdue outgoing invoice.
    ///
    /// Each debt is its own transaction; failures are logged and reported per
    /// debt without aborting the cycle.
    ///
    /// # Errors
    ///
    /// Returns an error only if the debt scan itself fails.
    pub async fn run_cycle(&self) -> Result<BatchReport<DebtRef, DunningDecision>, RepositoryError> {
        let now_millis = to_millis(self.clock.now());

        let tracking_ids: Vec<Uuid> = incoming_invoice_trackings::Entity::find()
            .select_only()
            .column(incoming_invoice_trackings::Column::Id)
            .filter(incoming_invoice_trackings::Column::DeletedAt.is_null())
            .filter(incoming_invoice_trackings::Column::Status.is_in([
                TrackingStatus::Expected.as_str(),
                TrackingStatus::Missing.as_str(),
            ]))
            .filter(incoming_invoice_trackings::Column::ExpectedDate.lt(now_millis))
            .order_by_asc(incoming_invoice_trackings::Column::ExpectedDate)
            .into_tuple()
            .all(&self.db)
            .await?;
        let invoice_ids: Vec<Uuid> = invoices::Entity::find()
            .select_only()
            .column(invoices::Column::Id)
            .filter(invoices::Column::DeletedAt.is_null())
            .filter(invoices::Column::Direction.eq("outgoing"))
            .filter(invoices::Column::Status.is_in([
                InvoiceStatus::Sent.as_str(),
                InvoiceStatus::Overdue.as_str(),
            ]))
            .filter(invoices::Column::DueDate.lt(now_millis))
            .order_by_asc(invoices::Column::DueDate)
            .into_tuple()
            .all(&self.db)
            .await?;

        let debts = tracking_ids
            .into_iter()
            .map(|id| DebtRef::Tracking(TrackingId::from_uuid(id)))
            .chain(
                invoice_ids
                    .into_iter()
                    .map(|id| DebtRef::Invoice(InvoiceId::from_uuid(id))),
            );

        let mut report = BatchReport::new();
        for debt in debts {
            let result = match debt {
                DebtRef::Tracking(id) => self.evaluate_tracking(id).await,
                DebtRef::Invoice(id) => self.evaluate_invoice(id).await,
            };
            if let Err(err) = &result {
                tracing::warn!(debt = %debt, error = %err, "Dunning evaluation failed");
            }
            report.record(debt, result);
        }

        tracing::info!(
            evaluated = report.succeeded,
            failed = report.failed,
            "Dunning cycle finished"
        );
        Ok(report)
    }

    /// Lifts the customer's suspension after an invoice was paid.
    ///
    /// Returns true if a suspension was lifted.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound` if the invoice does not exist.
    pub async fn handle_invoice_paid(&self, id: InvoiceId) -> Result<bool, RepositoryError> {
        let txn = self.db.begin().await?;
        let now = self.clock.now();

        let invoice = invoices::Entity::find_by_id(id.into_inner())
            .filter(invoices::Column::DeletedAt.is_null())
            .one(&txn)
            .await?
            .ok_or(DunningError::InvoiceNotFound(id))?;
        let Some(customer_id) = invoice.customer_id.map(CustomerId::from_uuid) else {
            return Ok(false);
        };
        if InvoiceStatus::parse(&invoice.status) != Some(InvoiceStatus::Paid) {
            return Ok(false);
        }

        let reactivated = self
            .reactivate(&txn, Party::Customer(customer_id), now)
            .await?;
        txn.commit().await?;
        Ok(reactivated)
    }

    /// Lifts the partner's suspension after a tracked invoice was paid.
    ///
    /// Returns true if a suspension was lifted.
    ///
    /// # Errors
    ///
    /// Returns `TrackingNotFound` if the tracking does not exist.
    pub async fn handle_tracking_paid(&self, id: TrackingId) -> Result<bool, RepositoryError> {
        let txn = self.db.begin().await?;
        let now = self.clock.now();

        let tracking = TrackingRepository::load(&txn, id)
            .await
            .map_err(|err| match err {
                RepositoryError::Tracking(_) => DunningError::TrackingNotFound(id).into(),
                other => other,
            })?;
        if tracking.status != TrackingStatus::Paid {
            return Ok(false);
        }

        let reactivated = self
            .reactivate(&txn, Party::Partner(tracking.partner_id), now)
            .await?;
        txn.commit().await?;
        Ok(reactivated)
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Returns the party's override, or the defaults when it has none.
    ///
    /// # Errors
    ///
    /// Returns `PartyNotFound` if the party does not exist.
    pub async fn get_config(&self, party: Party) -> Result<DunningConfig, RepositoryError> {
        self.ensure_party(&self.db, party).await?;
        self.config_for(&self.db, party).await
    }

    /// Creates or replaces the party's policy. Suspension state is kept.
    ///
    /// # Errors
    ///
    /// - `InvalidThresholds` / `NegativeFee` for an invalid policy
    /// - `PartyNotFound` if the party does not exist
    pub async fn upsert_config(
        &self,
        party: Party,
        policy: DunningPolicy,
        actor: Option<UserId>,
    ) -> Result<DunningConfig, RepositoryError> {
        DunningEngine::validate_policy(&policy)?;

        let txn = self.db.begin().await?;
        let now = self.clock.now();
        self.ensure_party(&txn, party).await?;

        let mut config = self.config_for(&txn, party).await?;
        config.policy = policy;
        Self::save_config(&txn, &mut config, now).await?;
        Self::audit_config(&txn, &config, LedgerEvent::DunningConfigUpdated { party }, actor, now)
            .await?;
        txn.commit().await?;

        tracing::info!(party = %party, "Dunning configuration updated");
        Ok(config)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn begin_snapshot(&self) -> Result<DatabaseTransaction, RepositoryError> {
        Ok(self
            .db
            .begin_with_config(Some(IsolationLevel::RepeatableRead), None)
            .await?)
    }

    /// Evaluates a debt and persists the resulting state, suspension and audit events.
    async fn decide<C: ConnectionTrait>(
        &self,
        conn: &C,
        snapshot: &DebtSnapshot,
        now: DateTime<Utc>,
    ) -> Result<DunningDecision, RepositoryError> {
        let mut config = self.config_for(conn, snapshot.party).await?;
        let (state_id, mut state) =
            Self::state_for(conn, snapshot, config.policy.fee_currency).await?;

        let decision = DunningEngine::evaluate(snapshot, &config, &state, now);
        let applied = DunningEngine::apply(&decision, &mut config, &mut state, now)?;

        Self::save_state(conn, state_id, &state, now).await?;
        if let Some(event) = applied.escalated {
            let entity_type = match snapshot.debt {
                DebtRef::Tracking(_) => AuditEntityType::Tracking,
                DebtRef::Invoice(_) => AuditEntityType::Invoice,
            };
            let entry = AuditEntry::new(entity_type, snapshot.debt.id(), event, None, now);
            audit::record(conn, &entry).await?;
        }
        if let Some(event) = applied.suspended {
            Self::save_config(conn, &mut config, now).await?;
            Self::audit_config(conn, &config, event, None, now).await?;
            tracing::warn!(party = %config.party, "Service suspended after final dunning level");
        }
        Ok(decision)
    }

    async fn reactivate<C: ConnectionTrait>(
        &self,
        conn: &C,
        party: Party,
        now: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut config = self.config_for(conn, party).await?;
        let Some(event) = DunningEngine::on_debt_paid(&mut config) else {
            return Ok(false);
        };
        Self::save_config(conn, &mut config, now).await?;
        Self::audit_config(conn, &config, event, None, now).await?;

        tracing::info!(party = %party, "Service reactivated after payment");
        Ok(true)
    }

    async fn config_for<C: ConnectionTrait>(
        &self,
        conn: &C,
        party: Party,
    ) -> Result<DunningConfig, RepositoryError> {
        let model = dunning_configs::Entity::find()
            .filter(dunning_configs::Column::PartyKind.eq(party.kind()))
            .filter(dunning_configs::Column::PartyId.eq(party.id()))
            .filter(dunning_configs::Column::DeletedAt.is_null())
            .one(conn)
            .await?;
        match model {
            Some(model) => dunning_config_from_model(model),
            None => Ok(DunningConfig::defaults_for(party, self.defaults)),
        }
    }

    /// Inserts the configuration when it has no row yet, else updates it.
    async fn save_config<C: ConnectionTrait>(
        conn: &C,
        config: &mut DunningConfig,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let now_millis = to_millis(now);
        match config.id {
            Some(id) => {
                dunning_config_active(id, config, now_millis)
                    .update(conn)
                    .await?;
            }
            None => {
                let id = DunningConfigId::new();
                let mut active = dunning_config_active(id, config, now_millis);
                active.created_at = Set(now_millis);
                active.insert(conn).await?;
                config.id = Some(id);
            }
        }
        Ok(())
    }

    async fn state_for<C: ConnectionTrait>(
        conn: &C,
        snapshot: &DebtSnapshot,
        fee_currency: Currency,
    ) -> Result<(Option<Uuid>, DunningState), RepositoryError> {
        let model = dunning_states::Entity::find()
            .filter(dunning_states::Column::DebtKind.eq(snapshot.debt.kind()))
            .filter(dunning_states::Column::DebtId.eq(snapshot.debt.id()))
            .filter(dunning_states::Column::DeletedAt.is_null())
            .one(conn)
            .await?;
        match model {
            Some(model) => Ok((Some(model.id), dunning_state_from_model(model)?)),
            None => Ok((
                None,
                DunningState::new(snapshot.debt, snapshot.party, fee_currency),
            )),
        }
    }

    async fn save_state<C: ConnectionTrait>(
        conn: &C,
        id: Option<Uuid>,
        state: &DunningState,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let now_millis = to_millis(now);
        match id {
            Some(id) => {
                dunning_state_active(id, state, now_millis)
                    .update(conn)
                    .await?;
            }
            None => {
                let mut active = dunning_state_active(Uuid::now_v7(), state, now_millis);
                active.created_at = Set(now_millis);
                active.insert(conn).await?;
            }
        }
        Ok(())
    }

    async fn ensure_party<C: ConnectionTrait>(
        &self,
        conn: &C,
        party: Party,
    ) -> Result<(), RepositoryError> {
        let count = match party {
            Party::Customer(id) => {
                customers::Entity::find_by_id(id.into_inner())
                    .filter(customers::Column::DeletedAt.is_null())
                    .count(conn)
                    .await?
            }
            Party::Partner(id) => {
                partners::Entity::find_by_id(id.into_inner())
                    .filter(partners::Column::DeletedAt.is_null())
                    .count(conn)
                    .await?
            }
        };
        if count == 0 {
            return Err(DunningError::PartyNotFound(party).into());
        }
        Ok(())
    }

    async fn audit_config<C: ConnectionTrait>(
        conn: &C,
        config: &DunningConfig,
        event: LedgerEvent,
        actor: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let entity_id = config.id.map_or_else(|| config.party.id(), DunningConfigId::into_inner);
        let entry = AuditEntry::new(AuditEntityType::DunningConfig, entity_id, event, actor, now);
        audit::record(conn, &entry).await
    }

    fn log_decision(decision: &DunningDecision) {
        if decision.level_advanced() {
            tracing::info!(
                debt = %decision.debt,
                party = %decision.party,
                level = decision.level.as_u8(),
                days_overdue = decision.days_overdue,
                fee = ?decision.fee_charged,
                "Dunning level advanced"
            );
        } else {
            tracing::debug!(
                debt = %decision.debt,
                level = decision.level.as_u8(),
                days_overdue = decision.days_overdue,
                "Dunning level unchanged"
            );
        }
    }
}
