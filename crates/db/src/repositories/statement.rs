//! Statement of accounts repository.
//!
//! Generation reads the customer's invoices and stores the snapshot inside one
//! `REPEATABLE READ` transaction. Snapshots are never updated except for their
//! export and send bookkeeping, and are only soft deleted.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    IsolationLevel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement,
    TransactionTrait,
};

use freightbook_core::aging::{AgingReport, AgingService, CustomerAging};
use freightbook_core::audit::{AuditEntityType, AuditEntry, LedgerEvent};
use freightbook_core::batch::BatchReport;
use freightbook_core::statement::{
    ExportFormat, RegenerationRequest, StatementError, StatementOfAccounts, StatementPeriod,
    StatementService, StatementSummary,
};
use freightbook_shared::SharedClock;
use freightbook_shared::clock::to_millis;
use freightbook_shared::types::{CustomerId, PageRequest, PageResponse, StatementId, UserId};

use crate::convert::{currency, invoice_from_model, statement_active, statement_from_model};
use crate::entities::{customers, invoices, statements_of_accounts};
use crate::repositories::{RepositoryError, audit};

/// Newest live statement per customer, served by `idx_statements_customer`.
const LATEST_PER_CUSTOMER: &str = "
SELECT DISTINCT ON (customer_id) *
FROM statements_of_accounts
WHERE deleted_at IS NULL
ORDER BY customer_id, generated_date DESC, id DESC
";

/// Skip reason reported by bulk generation for customers without activity.
pub const NO_ACTIVITY: &str = "no_activity";

/// Statement repository.
#[derive(Debug, Clone)]
pub struct StatementRepository {
    db: DatabaseConnection,
    clock: SharedClock,
}

impl StatementRepository {
    /// Creates a new statement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, clock: SharedClock) -> Self {
        Self { db, clock }
    }

    // ========================================================================
    // Generation
    // ========================================================================

    /// Generates and stores a statement for one customer and period.
    ///
    /// # Errors
    ///
    /// - `CustomerNotFound` if the customer does not exist
    /// - `Money` if an invoice in another currency has no exchange rate
    pub async fn generate(
        &self,
        customer_id: CustomerId,
        period: StatementPeriod,
        actor: Option<UserId>,
    ) -> Result<StatementSummary, RepositoryError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::RepeatableRead), None)
            .await?;
        let now = self.clock.now();
        let statement = Self::generate_in(&txn, customer_id, period, now, actor, false)
            .await?
            .ok_or_else(|| RepositoryError::corrupt("statement generation returned nothing"))?;
        txn.commit().await?;

        let summary = StatementService::summarize(&statement);
        tracing::info!(
            statement_id = %summary.statement_id,
            customer_id = %customer_id,
            transactions = summary.transaction_count,
            outstanding = summary.outstanding_count,
            closing_balance = %summary.closing_balance,
            "Statement generated"
        );
        Ok(summary)
    }

    /// Soft deletes a statement and returns the parameters to generate it again.
    ///
    /// Until the caller generates the replacement no statement exists for the
    /// period; use [`Self::replace`] to do both atomically.
    ///
    /// # Errors
    ///
    /// Returns `StatementNotFound` if the statement does not exist.
    pub async fn regenerate(
        &self,
        id: StatementId,
        actor: Option<UserId>,
    ) -> Result<RegenerationRequest, RepositoryError> {
        let txn = self.db.begin().await?;
        let now = self.clock.now();
        let statement = Self::load(&txn, id).await?;
        Self::soft_delete(&txn, id, now).await?;
        Self::audit(
            &txn,
            id,
            LedgerEvent::StatementInvalidated {
                customer_id: statement.customer_id,
            },
            actor,
            now,
        )
        .await?;
        txn.commit().await?;

        tracing::info!(statement_id = %id, customer_id = %statement.customer_id, "Statement invalidated");
        Ok(RegenerationRequest {
            customer_id: statement.customer_id,
            start_date: statement.start_date,
            end_date: statement.end_date,
        })
    }

    /// Invalidates a statement and generates its replacement in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `StatementNotFound` if the statement does not exist.
    pub async fn replace(
        &self,
        id: StatementId,
        actor: Option<UserId>,
    ) -> Result<StatementSummary, RepositoryError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::RepeatableRead), None)
            .await?;
        let now = self.clock.now();
        let old = Self::load(&txn, id).await?;
        Self::soft_delete(&txn, id, now).await?;
        Self::audit(
            &txn,
            id,
            LedgerEvent::StatementInvalidated {
                customer_id: old.customer_id,
            },
            actor,
            now,
        )
        .await?;
        let statement = Self::generate_in(&txn, old.customer_id, old.period(), now, actor, false)
            .await?
            .ok_or_else(|| RepositoryError::corrupt("statement generation returned nothing"))?;
        txn.commit().await?;

        tracing::info!(old_statement_id = %id, statement_id = %statement.id, "Statement replaced");
        Ok(StatementService::summarize(&statement))
    }

    /// Generates statements for the given customers, or every customer.
    ///
    /// Customers without activity in the period are skipped. Each customer is
    /// its own transaction; failures are logged and reported per customer.
    ///
    /// # Errors
    ///
    /// Returns an error only if listing the customers fails.
    pub async fn bulk_generate(
        &self,
        period: StatementPeriod,
        customer_ids: Option<Vec<CustomerId>>,
    ) -> Result<BatchReport<CustomerId, StatementSummary>, RepositoryError> {
        let targets = match customer_ids {
            Some(ids) => ids,
            None => customers::Entity::find()
                .select_only()
                .column(customers::Column::Id)
                .filter(customers::Column::DeletedAt.is_null())
                .order_by_asc(customers::Column::Id)
                .into_tuple::<uuid::Uuid>()
                .all(&self.db)
                .await?
                .into_iter()
                .map(CustomerId::from_uuid)
                .collect(),
        };

        let mut report = BatchReport::new();
        for customer_id in targets {
            match self.generate_one(customer_id, period).await {
                Ok(Some(summary)) => report.succeed(customer_id, summary),
                Ok(None) => report.skip(customer_id, NO_ACTIVITY),
                Err(err) => {
                    tracing::warn!(customer_id = %customer_id, error = %err, "Statement generation failed");
                    report.fail(customer_id, err);
                }
            }
        }

        tracing::info!(
            generated = report.succeeded,
            skipped = report.skipped,
            failed = report.failed,
            "Bulk statement generation finished"
        );
        Ok(report)
    }

    // ========================================================================
    // Bookkeeping
    // ========================================================================

    /// Records an export of the statement.
    ///
    /// # Errors
    ///
    /// Returns `StatementNotFound` if the statement does not exist.
    pub async fn mark_exported(
        &self,
        id: StatementId,
        format: ExportFormat,
        actor: Option<UserId>,
    ) -> Result<StatementOfAccounts, RepositoryError> {
        let txn = self.db.begin().await?;
        let now = self.clock.now();
        let mut statement = Self::load(&txn, id).await?;
        let event = StatementService::mark_exported(&mut statement, format, now);

        statements_of_accounts::ActiveModel {
            id: Set(id.into_inner()),
            exported_at: Set(Some(to_millis(now))),
            export_format: Set(Some(format.as_str().to_string())),
            updated_at: Set(to_millis(now)),
            ..Default::default()
        }
        .update(&txn)
        .await?;
        Self::audit(&txn, id, event, actor, now).await?;
        txn.commit().await?;

        tracing::info!(statement_id = %id, format = %format, "Statement exported");
        Ok(statement)
    }

    /// Records that the statement was sent.
    ///
    /// The recipient defaults to the customer's directory e-mail address.
    ///
    /// # Errors
    ///
    /// - `StatementNotFound` if the statement does not exist
    /// - `MissingRecipient` / `InvalidRecipient` if no usable address is found
    pub async fn send(
        &self,
        id: StatementId,
        recipient: Option<String>,
        actor: Option<UserId>,
    ) -> Result<StatementOfAccounts, RepositoryError> {
        let txn = self.db.begin().await?;
        let now = self.clock.now();
        let mut statement = Self::load(&txn, id).await?;
        let customer = customers::Entity::find_by_id(statement.customer_id.into_inner())
            .one(&txn)
            .await?
            .ok_or(StatementError::CustomerNotFound(statement.customer_id))?;
        let recipient =
            StatementService::resolve_recipient(recipient.as_deref(), customer.email.as_deref())?;
        let event = StatementService::mark_sent(&mut statement, recipient.clone(), now);

        statements_of_accounts::ActiveModel {
            id: Set(id.into_inner()),
            sent_at: Set(Some(to_millis(now))),
            sent_to: Set(Some(recipient)),
            updated_at: Set(to_millis(now)),
            ..Default::default()
        }
        .update(&txn)
        .await?;
        Self::audit(&txn, id, event, actor, now).await?;
        txn.commit().await?;

        tracing::info!(statement_id = %id, "Statement sent");
        Ok(statement)
    }

    /// Soft deletes a statement.
    ///
    /// # Errors
    ///
    /// Returns `StatementNotFound` if the statement does not exist.
    pub async fn delete(&self, id: StatementId, actor: Option<UserId>) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;
        let now = self.clock.now();
        Self::load(&txn, id).await?;
        Self::soft_delete(&txn, id, now).await?;
        Self::audit(&txn, id, LedgerEvent::StatementDeleted, actor, now).await?;
        txn.commit().await?;

        tracing::info!(statement_id = %id, "Statement deleted");
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Gets a statement by ID.
    ///
    /// # Errors
    ///
    /// Returns `StatementNotFound` if the statement does not exist.
    pub async fn get(&self, id: StatementId) -> Result<StatementOfAccounts, RepositoryError> {
        Self::load(&self.db, id).await
    }

    /// Lists a customer's statements, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn customer_statements(
        &self,
        customer_id: CustomerId,
        page: PageRequest,
    ) -> Result<PageResponse<StatementOfAccounts>, RepositoryError> {
        let query = statements_of_accounts::Entity::find()
            .filter(statements_of_accounts::Column::CustomerId.eq(customer_id.into_inner()))
            .filter(statements_of_accounts::Column::DeletedAt.is_null());

        let total = query.clone().count(&self.db).await?;
        let data = query
            .order_by_desc(statements_of_accounts::Column::GeneratedDate)
            .order_by_desc(statements_of_accounts::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?
            .into_iter()
            .map(statement_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(data, page, total))
    }

    /// The most recent statement of every customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn latest(&self) -> Result<Vec<StatementOfAccounts>, RepositoryError> {
        statements_of_accounts::Entity::find()
            .from_raw_sql(Statement::from_string(DbBackend::Postgres, LATEST_PER_CUSTOMER))
            .all(&self.db)
            .await?
            .into_iter()
            .map(statement_from_model)
            .collect()
    }

    /// Statements whose period lies inside `[start, end]`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn by_period(
        &self,
        period: StatementPeriod,
    ) -> Result<Vec<StatementOfAccounts>, RepositoryError> {
        statements_of_accounts::Entity::find()
            .filter(statements_of_accounts::Column::DeletedAt.is_null())
            .filter(statements_of_accounts::Column::StartDate.gte(to_millis(period.start)))
            .filter(statements_of_accounts::Column::EndDate.lte(to_millis(period.end)))
            .order_by_desc(statements_of_accounts::Column::GeneratedDate)
            .all(&self.db)
            .await?
            .into_iter()
            .map(statement_from_model)
            .collect()
    }

    /// Aging report over the latest statement of every customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn aging_report(&self) -> Result<AgingReport, RepositoryError> {
        let latest = self.latest().await?;
        Ok(AgingService::build(latest, self.clock.now()))
    }

    /// The `limit` customers with the highest outstanding totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn top_outstanding(&self, limit: usize) -> Result<Vec<CustomerAging>, RepositoryError> {
        let report = self.aging_report().await?;
        Ok(AgingService::top_outstanding(&report, limit))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn generate_one(
        &self,
        customer_id: CustomerId,
        period: StatementPeriod,
    ) -> Result<Option<StatementSummary>, RepositoryError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::RepeatableRead), None)
            .await?;
        let now = self.clock.now();
        let statement = Self::generate_in(&txn, customer_id, period, now, None, true).await?;
        txn.commit().await?;
        Ok(statement.as_ref().map(StatementService::summarize))
    }

    /// Builds and stores a statement; with `skip_empty` returns `None` when the
    /// customer has no activity for the period.
    async fn generate_in<C: ConnectionTrait>(
        conn: &C,
        customer_id: CustomerId,
        period: StatementPeriod,
        now: DateTime<Utc>,
        actor: Option<UserId>,
        skip_empty: bool,
    ) -> Result<Option<StatementOfAccounts>, RepositoryError> {
        let customer = customers::Entity::find_by_id(customer_id.into_inner())
            .filter(customers::Column::DeletedAt.is_null())
            .one(conn)
            .await?
            .ok_or(StatementError::CustomerNotFound(customer_id))?;

        let records = invoices::Entity::find()
            .filter(invoices::Column::CustomerId.eq(customer_id.into_inner()))
            .filter(invoices::Column::Direction.eq("outgoing"))
            .filter(invoices::Column::DeletedAt.is_null())
            .filter(invoices::Column::IssueDate.lte(to_millis(period.end)))
            .order_by_asc(invoices::Column::IssueDate)
            .all(conn)
            .await?
            .into_iter()
            .map(invoice_from_model)
            .collect::<Result<Vec<_>, _>>()?;
        if skip_empty && !StatementService::has_activity(&records, &period) {
            return Ok(None);
        }

        let statement = StatementService::build(
            customer_id,
            period,
            currency(&customer.currency)?,
            &records,
            now,
        )?;
        statement_active(&statement, to_millis(now))?
            .insert(conn)
            .await?;
        Self::audit(
            conn,
            statement.id,
            StatementService::generated_event(&statement),
            actor,
            now,
        )
        .await?;
        Ok(Some(statement))
    }

    async fn load<C: ConnectionTrait>(
        conn: &C,
        id: StatementId,
    ) -> Result<StatementOfAccounts, RepositoryError> {
        let model = statements_of_accounts::Entity::find_by_id(id.into_inner())
            .filter(statements_of_accounts::Column::DeletedAt.is_null())
            .one(conn)
            .await?
            .ok_or(StatementError::StatementNotFound(id))?;
        statement_from_model(model)
    }

    async fn soft_delete<C: ConnectionTrait>(
        conn: &C,
        id: StatementId,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        statements_of_accounts::ActiveModel {
            id: Set(id.into_inner()),
            deleted_at: Set(Some(to_millis(now))),
            updated_at: Set(to_millis(now)),
            ..Default::default()
        }
        .update(conn)
        .await?;
        Ok(())
    }

    async fn audit<C: ConnectionTrait>(
        conn: &C,
        id: StatementId,
        event: LedgerEvent,
        actor: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let entry = AuditEntry::new(AuditEntityType::Statement, id.into_inner(), event, actor, now);
        audit::record(conn, &entry).await
    }
}
