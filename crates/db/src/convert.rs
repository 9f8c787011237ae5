//! Conversions between `SeaORM` models and core domain types.
//!
//! Money is stored as `*_amount`, `*_currency`, `*_exchange_rate` column triples
//! and instants as milliseconds since the epoch.

use rust_decimal::Decimal;
use sea_orm::{NotSet, Set};
use uuid::Uuid;

use freightbook_core::dunning::{
    DebtRef, DunningConfig, DunningLevel, DunningPolicy, DunningState, LevelPolicy, Party,
};
use freightbook_core::statement::{ExportFormat, InvoiceRecord, InvoiceStatus, StatementOfAccounts};
use freightbook_core::tracking::{IncomingInvoiceTracking, TrackingStatus};
use freightbook_shared::clock::{from_millis, to_millis};
use freightbook_shared::types::{
    Currency, CurrencyAmount, CustomerId, DunningConfigId, InvoiceId, PartnerId, ShipmentId,
    StatementId, TrackingId, UserId,
};

use crate::entities::{
    dunning_configs, dunning_states, incoming_invoice_trackings, invoices, statements_of_accounts,
};
use crate::repositories::RepositoryError;

// ============================================================================
// Money
// ============================================================================

/// Parses a stored currency code.
pub(crate) fn currency(code: &str) -> Result<Currency, RepositoryError> {
    code.parse()
        .map_err(|e: freightbook_shared::types::MoneyError| RepositoryError::corrupt(e.to_string()))
}

/// Rebuilds an amount from its column triple.
pub(crate) fn money(
    amount: Decimal,
    code: &str,
    rate: Option<Decimal>,
) -> Result<CurrencyAmount, RepositoryError> {
    let value = CurrencyAmount::new(amount, currency(code)?);
    match rate {
        Some(rate) => value
            .with_exchange_rate(rate)
            .map_err(|e| RepositoryError::corrupt(e.to_string())),
        None => Ok(value),
    }
}

/// Rebuilds an optional amount; a missing amount or currency yields `None`.
pub(crate) fn opt_money(
    amount: Option<Decimal>,
    code: Option<&str>,
    rate: Option<Decimal>,
) -> Result<Option<CurrencyAmount>, RepositoryError> {
    match (amount, code) {
        (Some(amount), Some(code)) => money(amount, code, rate).map(Some),
        _ => Ok(None),
    }
}

/// Splits an optional amount into its column triple.
pub(crate) fn money_columns(
    value: Option<CurrencyAmount>,
) -> (Option<Decimal>, Option<String>, Option<Decimal>) {
    value.map_or((None, None, None), |v| {
        (Some(v.amount), Some(v.currency.as_str().to_string()), v.exchange_rate)
    })
}

fn opt_from_millis(millis: Option<i64>) -> Option<chrono::DateTime<chrono::Utc>> {
    millis.map(from_millis)
}

fn opt_to_millis(at: Option<chrono::DateTime<chrono::Utc>>) -> Option<i64> {
    at.map(to_millis)
}

// ============================================================================
// Trackings
// ============================================================================

/// Maps a tracking row to the domain type.
pub(crate) fn tracking_from_model(
    model: incoming_invoice_trackings::Model,
) -> Result<IncomingInvoiceTracking, RepositoryError> {
    let status = TrackingStatus::parse(&model.status)
        .ok_or_else(|| RepositoryError::corrupt(format!("tracking status '{}'", model.status)))?;

    Ok(IncomingInvoiceTracking {
        id: TrackingId::from_uuid(model.id),
        shipment_id: ShipmentId::from_uuid(model.shipment_id),
        partner_id: PartnerId::from_uuid(model.partner_id),
        expected_date: from_millis(model.expected_date),
        expected_amount: opt_money(
            model.expected_amount,
            model.expected_currency.as_deref(),
            model.expected_exchange_rate,
        )?,
        invoice_id: model.invoice_id.map(InvoiceId::from_uuid),
        received_date: opt_from_millis(model.received_date),
        actual_amount: opt_money(
            model.actual_amount,
            model.actual_currency.as_deref(),
            model.actual_exchange_rate,
        )?,
        status,
        reminders_sent: u32::try_from(model.reminders_sent).unwrap_or_default(),
        last_reminder_date: opt_from_millis(model.last_reminder_date),
        dispute_reason: model.dispute_reason,
        dispute_date: opt_from_millis(model.dispute_date),
        dispute_resolved_date: opt_from_millis(model.dispute_resolved_date),
        approved_by: model.approved_by.map(UserId::from_uuid),
        approved_date: opt_from_millis(model.approved_date),
        approval_notes: model.approval_notes,
        payment_reference: model.payment_reference,
        paid_date: opt_from_millis(model.paid_date),
        internal_notes: model.internal_notes,
        created_at: from_millis(model.created_at),
        updated_at: from_millis(model.updated_at),
    })
}

/// Builds a fully set active model from a tracking.
pub(crate) fn tracking_active(
    tracking: &IncomingInvoiceTracking,
) -> incoming_invoice_trackings::ActiveModel {
    let (expected_amount, expected_currency, expected_exchange_rate) =
        money_columns(tracking.expected_amount);
    let (actual_amount, actual_currency, actual_exchange_rate) =
        money_columns(tracking.actual_amount);

    incoming_invoice_trackings::ActiveModel {
        id: Set(tracking.id.into_inner()),
        shipment_id: Set(tracking.shipment_id.into_inner()),
        partner_id: Set(tracking.partner_id.into_inner()),
        expected_date: Set(to_millis(tracking.expected_date)),
        expected_amount: Set(expected_amount),
        expected_currency: Set(expected_currency),
        expected_exchange_rate: Set(expected_exchange_rate),
        invoice_id: Set(tracking.invoice_id.map(InvoiceId::into_inner)),
        received_date: Set(opt_to_millis(tracking.received_date)),
        actual_amount: Set(actual_amount),
        actual_currency: Set(actual_currency),
        actual_exchange_rate: Set(actual_exchange_rate),
        status: Set(tracking.status.as_str().to_string()),
        reminders_sent: Set(i32::try_from(tracking.reminders_sent).unwrap_or(i32::MAX)),
        last_reminder_date: Set(opt_to_millis(tracking.last_reminder_date)),
        dispute_reason: Set(tracking.dispute_reason.clone()),
        dispute_date: Set(opt_to_millis(tracking.dispute_date)),
        dispute_resolved_date: Set(opt_to_millis(tracking.dispute_resolved_date)),
        approved_by: Set(tracking.approved_by.map(UserId::into_inner)),
        approved_date: Set(opt_to_millis(tracking.approved_date)),
        approval_notes: Set(tracking.approval_notes.clone()),
        payment_reference: Set(tracking.payment_reference.clone()),
        paid_date: Set(opt_to_millis(tracking.paid_date)),
        internal_notes: Set(tracking.internal_notes.clone()),
        created_at: Set(to_millis(tracking.created_at)),
        updated_at: Set(to_millis(tracking.updated_at)),
        deleted_at: NotSet,
    }
}

// ============================================================================
// Invoices
// ============================================================================

/// Maps an invoice row to the read-only view used by statements and dunning.
pub(crate) fn invoice_from_model(model: invoices::Model) -> Result<InvoiceRecord, RepositoryError> {
    let status = InvoiceStatus::parse(&model.status)
        .ok_or_else(|| RepositoryError::corrupt(format!("invoice status '{}'", model.status)))?;

    Ok(InvoiceRecord {
        id: InvoiceId::from_uuid(model.id),
        invoice_number: model.invoice_number,
        issue_date: from_millis(model.issue_date),
        due_date: from_millis(model.due_date),
        total_amount: money(
            model.total_amount,
            &model.total_currency,
            model.total_exchange_rate,
        )?,
        paid_amount: opt_money(
            model.paid_amount,
            model.paid_currency.as_deref(),
            model.paid_exchange_rate,
        )?,
        paid_date: opt_from_millis(model.paid_date),
        status,
    })
}

// ============================================================================
// Statements
// ============================================================================

/// Maps a statement row to the domain snapshot.
pub(crate) fn statement_from_model(
    model: statements_of_accounts::Model,
) -> Result<StatementOfAccounts, RepositoryError> {
    let export_format = match model.export_format.as_deref() {
        Some(raw) => Some(
            ExportFormat::parse(raw)
                .ok_or_else(|| RepositoryError::corrupt(format!("export format '{raw}'")))?,
        ),
        None => None,
    };

    Ok(StatementOfAccounts {
        id: StatementId::from_uuid(model.id),
        customer_id: CustomerId::from_uuid(model.customer_id),
        start_date: from_millis(model.start_date),
        end_date: from_millis(model.end_date),
        generated_date: from_millis(model.generated_date),
        currency: currency(&model.currency)?,
        opening_balance: money(
            model.opening_balance_amount,
            &model.opening_balance_currency,
            model.opening_balance_exchange_rate,
        )?,
        total_invoiced: money(
            model.total_invoiced_amount,
            &model.total_invoiced_currency,
            model.total_invoiced_exchange_rate,
        )?,
        total_paid: money(
            model.total_paid_amount,
            &model.total_paid_currency,
            model.total_paid_exchange_rate,
        )?,
        closing_balance: money(
            model.closing_balance_amount,
            &model.closing_balance_currency,
            model.closing_balance_exchange_rate,
        )?,
        transactions: serde_json::from_value(model.transactions)?,
        outstanding_invoices: serde_json::from_value(model.outstanding_invoices)?,
        exported_at: opt_from_millis(model.exported_at),
        export_format,
        sent_at: opt_from_millis(model.sent_at),
        sent_to: model.sent_to,
    })
}

/// Builds a fully set active model from a statement.
pub(crate) fn statement_active(
    statement: &StatementOfAccounts,
    now_millis: i64,
) -> Result<statements_of_accounts::ActiveModel, RepositoryError> {
    let code = |v: &CurrencyAmount| v.currency.as_str().to_string();

    Ok(statements_of_accounts::ActiveModel {
        id: Set(statement.id.into_inner()),
        customer_id: Set(statement.customer_id.into_inner()),
        start_date: Set(to_millis(statement.start_date)),
        end_date: Set(to_millis(statement.end_date)),
        generated_date: Set(to_millis(statement.generated_date)),
        currency: Set(statement.currency.as_str().to_string()),
        opening_balance_amount: Set(statement.opening_balance.amount),
        opening_balance_currency: Set(code(&statement.opening_balance)),
        opening_balance_exchange_rate: Set(statement.opening_balance.exchange_rate),
        total_invoiced_amount: Set(statement.total_invoiced.amount),
        total_invoiced_currency: Set(code(&statement.total_invoiced)),
        total_invoiced_exchange_rate: Set(statement.total_invoiced.exchange_rate),
        total_paid_amount: Set(statement.total_paid.amount),
        total_paid_currency: Set(code(&statement.total_paid)),
        total_paid_exchange_rate: Set(statement.total_paid.exchange_rate),
        closing_balance_amount: Set(statement.closing_balance.amount),
        closing_balance_currency: Set(code(&statement.closing_balance)),
        closing_balance_exchange_rate: Set(statement.closing_balance.exchange_rate),
        transactions: Set(serde_json::to_value(&statement.transactions)?),
        outstanding_invoices: Set(serde_json::to_value(&statement.outstanding_invoices)?),
        exported_at: Set(opt_to_millis(statement.exported_at)),
        export_format: Set(statement.export_format.map(|f| f.as_str().to_string())),
        sent_at: Set(opt_to_millis(statement.sent_at)),
        sent_to: Set(statement.sent_to.clone()),
        created_at: Set(now_millis),
        updated_at: Set(now_millis),
        deleted_at: NotSet,
    })
}

// ============================================================================
// Dunning
// ============================================================================

fn party(kind: &str, id: Uuid) -> Result<Party, RepositoryError> {
    Party::from_parts(kind, id).ok_or_else(|| RepositoryError::corrupt(format!("party kind '{kind}'")))
}

fn level_policy(days: i32, fee: Decimal, auto_send: bool) -> LevelPolicy {
    LevelPolicy {
        days_overdue: i64::from(days),
        fee,
        auto_send,
    }
}

fn days_column(days: i64) -> i32 {
    i32::try_from(days).unwrap_or(i32::MAX)
}

/// Maps a dunning configuration row to the domain type.
pub(crate) fn dunning_config_from_model(
    model: dunning_configs::Model,
) -> Result<DunningConfig, RepositoryError> {
    Ok(DunningConfig {
        id: Some(DunningConfigId::from_uuid(model.id)),
        party: party(&model.party_kind, model.party_id)?,
        policy: DunningPolicy {
            level1: level_policy(model.level1_days, model.level1_fee, model.level1_auto_send),
            level2: level_policy(model.level2_days, model.level2_fee, model.level2_auto_send),
            level3: level_policy(model.level3_days, model.level3_fee, model.level3_auto_send),
            fee_currency: currency(&model.fee_currency)?,
            level3_suspend_service: model.level3_suspend_service,
            auto_reactivate_on_payment: model.auto_reactivate_on_payment,
        },
        service_suspended: model.service_suspended,
        service_suspended_date: opt_from_millis(model.service_suspended_date),
    })
}

/// Builds an active model for a dunning configuration; `created_at` is left unset.
pub(crate) fn dunning_config_active(
    id: DunningConfigId,
    config: &DunningConfig,
    now_millis: i64,
) -> dunning_configs::ActiveModel {
    let policy = &config.policy;
    dunning_configs::ActiveModel {
        id: Set(id.into_inner()),
        party_kind: Set(config.party.kind().to_string()),
        party_id: Set(config.party.id()),
        level1_days: Set(days_column(policy.level1.days_overdue)),
        level1_fee: Set(policy.level1.fee),
        level1_auto_send: Set(policy.level1.auto_send),
        level2_days: Set(days_column(policy.level2.days_overdue)),
        level2_fee: Set(policy.level2.fee),
        level2_auto_send: Set(policy.level2.auto_send),
        level3_days: Set(days_column(policy.level3.days_overdue)),
        level3_fee: Set(policy.level3.fee),
        level3_auto_send: Set(policy.level3.auto_send),
        fee_currency: Set(policy.fee_currency.as_str().to_string()),
        level3_suspend_service: Set(policy.level3_suspend_service),
        auto_reactivate_on_payment: Set(policy.auto_reactivate_on_payment),
        service_suspended: Set(config.service_suspended),
        service_suspended_date: Set(opt_to_millis(config.service_suspended_date)),
        created_at: NotSet,
        updated_at: Set(now_millis),
        deleted_at: NotSet,
    }
}

/// Maps a dunning state row to the domain type.
pub(crate) fn dunning_state_from_model(
    model: dunning_states::Model,
) -> Result<DunningState, RepositoryError> {
    let debt = DebtRef::from_parts(&model.debt_kind, model.debt_id)
        .ok_or_else(|| RepositoryError::corrupt(format!("debt kind '{}'", model.debt_kind)))?;
    let last_applied_level = u8::try_from(model.last_applied_level)
        .ok()
        .and_then(DunningLevel::from_u8)
        .ok_or_else(|| {
            RepositoryError::corrupt(format!("dunning level {}", model.last_applied_level))
        })?;

    Ok(DunningState {
        debt,
        party: party(&model.party_kind, model.party_id)?,
        last_applied_level,
        fees_charged: money(
            model.fees_charged_amount,
            &model.fees_charged_currency,
            model.fees_charged_exchange_rate,
        )?,
        last_evaluated_at: opt_from_millis(model.last_evaluated_at),
    })
}

/// Builds an active model for a dunning state; `created_at` is left unset.
pub(crate) fn dunning_state_active(
    id: Uuid,
    state: &DunningState,
    now_millis: i64,
) -> dunning_states::ActiveModel {
    dunning_states::ActiveModel {
        id: Set(id),
        debt_kind: Set(state.debt.kind().to_string()),
        debt_id: Set(state.debt.id()),
        party_kind: Set(state.party.kind().to_string()),
        party_id: Set(state.party.id()),
        last_applied_level: Set(i16::from(state.last_applied_level.as_u8())),
        fees_charged_amount: Set(state.fees_charged.amount),
        fees_charged_currency: Set(state.fees_charged.currency.as_str().to_string()),
        fees_charged_exchange_rate: Set(state.fees_charged.exchange_rate),
        last_evaluated_at: Set(opt_to_millis(state.last_evaluated_at)),
        created_at: NotSet,
        updated_at: Set(now_millis),
        deleted_at: NotSet,
    }
}
