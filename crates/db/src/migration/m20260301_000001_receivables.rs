//! Receivables ledger migration.
//!
//! Creates the collaborator tables (customers, partners, shipments, invoices),
//! the tracking, dunning and statement tables, and the audit log.
//! Timestamps are milliseconds since the Unix epoch (`BIGINT`); money is stored
//! as `*_amount` / `*_currency` / `*_exchange_rate` column triples.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: DIRECTORY & OPERATIONS (collaborators)
        // ============================================================
        db.execute_unprepared(CUSTOMERS_SQL).await?;
        db.execute_unprepared(PARTNERS_SQL).await?;
        db.execute_unprepared(SHIPMENTS_SQL).await?;
        db.execute_unprepared(INVOICES_SQL).await?;

        // ============================================================
        // PART 2: EXPECTED INVOICE TRACKING
        // ============================================================
        db.execute_unprepared(TRACKINGS_SQL).await?;

        // ============================================================
        // PART 3: DUNNING
        // ============================================================
        db.execute_unprepared(DUNNING_CONFIGS_SQL).await?;
        db.execute_unprepared(DUNNING_STATES_SQL).await?;

        // ============================================================
        // PART 4: STATEMENTS
        // ============================================================
        db.execute_unprepared(STATEMENTS_SQL).await?;

        // ============================================================
        // PART 5: AUDIT LOG
        // ============================================================
        db.execute_unprepared(AUDIT_LOG_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const CUSTOMERS_SQL: &str = r"
CREATE TABLE customers (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255),
    currency CHAR(3) NOT NULL DEFAULT 'EUR',
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL,
    deleted_at BIGINT
);
";

const PARTNERS_SQL: &str = r"
CREATE TABLE partners (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    email VARCHAR(255),
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL,
    deleted_at BIGINT
);
";

const SHIPMENTS_SQL: &str = r"
CREATE TABLE shipments (
    id UUID PRIMARY KEY,
    reference VARCHAR(100) NOT NULL,
    customer_id UUID REFERENCES customers(id),
    partner_id UUID REFERENCES partners(id),
    status VARCHAR(30) NOT NULL,
    delivered_at BIGINT,
    agreed_cost_amount NUMERIC(19, 4),
    agreed_cost_currency CHAR(3),
    agreed_cost_exchange_rate NUMERIC(19, 8),
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL,
    deleted_at BIGINT
);

CREATE INDEX idx_shipments_delivered ON shipments(delivered_at)
    WHERE status = 'delivered' AND deleted_at IS NULL;
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id UUID PRIMARY KEY,
    invoice_number VARCHAR(50) NOT NULL,
    direction VARCHAR(10) NOT NULL CHECK (direction IN ('outgoing', 'incoming')),
    customer_id UUID REFERENCES customers(id),
    partner_id UUID REFERENCES partners(id),
    shipment_id UUID REFERENCES shipments(id),
    issue_date BIGINT NOT NULL,
    due_date BIGINT NOT NULL,
    total_amount NUMERIC(19, 4) NOT NULL,
    total_currency CHAR(3) NOT NULL,
    total_exchange_rate NUMERIC(19, 8),
    paid_amount NUMERIC(19, 4),
    paid_currency CHAR(3),
    paid_exchange_rate NUMERIC(19, 8),
    paid_date BIGINT,
    status VARCHAR(20) NOT NULL
        CHECK (status IN ('draft', 'sent', 'paid', 'overdue', 'cancelled')),
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL,
    deleted_at BIGINT
);

CREATE INDEX idx_invoices_customer ON invoices(customer_id, issue_date)
    WHERE direction = 'outgoing' AND deleted_at IS NULL;
CREATE INDEX idx_invoices_shipment ON invoices(shipment_id)
    WHERE direction = 'incoming' AND deleted_at IS NULL;
";

const TRACKINGS_SQL: &str = r"
CREATE TABLE incoming_invoice_trackings (
    id UUID PRIMARY KEY,
    shipment_id UUID NOT NULL REFERENCES shipments(id),
    partner_id UUID NOT NULL REFERENCES partners(id),
    expected_date BIGINT NOT NULL,
    expected_amount NUMERIC(19, 4),
    expected_currency CHAR(3),
    expected_exchange_rate NUMERIC(19, 8),
    invoice_id UUID REFERENCES invoices(id),
    received_date BIGINT,
    actual_amount NUMERIC(19, 4),
    actual_currency CHAR(3),
    actual_exchange_rate NUMERIC(19, 8),
    status VARCHAR(20) NOT NULL
        CHECK (status IN ('expected', 'received', 'approved', 'paid', 'missing', 'disputed', 'cancelled')),
    reminders_sent INTEGER NOT NULL DEFAULT 0 CHECK (reminders_sent >= 0),
    last_reminder_date BIGINT,
    dispute_reason TEXT,
    dispute_date BIGINT,
    dispute_resolved_date BIGINT,
    approved_by UUID,
    approved_date BIGINT,
    approval_notes TEXT,
    payment_reference VARCHAR(100),
    paid_date BIGINT,
    internal_notes TEXT NOT NULL DEFAULT '',
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL,
    deleted_at BIGINT
);

-- One live tracking per shipment; concurrent creation fails here.
CREATE UNIQUE INDEX uq_trackings_shipment ON incoming_invoice_trackings(shipment_id)
    WHERE deleted_at IS NULL;
CREATE INDEX idx_trackings_status ON incoming_invoice_trackings(status, expected_date);
CREATE INDEX idx_trackings_partner ON incoming_invoice_trackings(partner_id);
";

const DUNNING_CONFIGS_SQL: &str = r"
CREATE TABLE dunning_configs (
    id UUID PRIMARY KEY,
    party_kind VARCHAR(10) NOT NULL CHECK (party_kind IN ('customer', 'partner')),
    party_id UUID NOT NULL,
    level1_days INTEGER NOT NULL,
    level1_fee NUMERIC(19, 4) NOT NULL,
    level1_auto_send BOOLEAN NOT NULL DEFAULT true,
    level2_days INTEGER NOT NULL,
    level2_fee NUMERIC(19, 4) NOT NULL,
    level2_auto_send BOOLEAN NOT NULL DEFAULT true,
    level3_days INTEGER NOT NULL,
    level3_fee NUMERIC(19, 4) NOT NULL,
    level3_auto_send BOOLEAN NOT NULL DEFAULT true,
    fee_currency CHAR(3) NOT NULL,
    level3_suspend_service BOOLEAN NOT NULL DEFAULT true,
    auto_reactivate_on_payment BOOLEAN NOT NULL DEFAULT true,
    service_suspended BOOLEAN NOT NULL DEFAULT false,
    service_suspended_date BIGINT,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL,
    deleted_at BIGINT,
    CHECK (level1_days > 0 AND level1_days < level2_days AND level2_days < level3_days),
    CHECK (level1_fee >= 0 AND level2_fee >= 0 AND level3_fee >= 0)
);

CREATE UNIQUE INDEX uq_dunning_configs_party ON dunning_configs(party_kind, party_id)
    WHERE deleted_at IS NULL;
";

const DUNNING_STATES_SQL: &str = r"
CREATE TABLE dunning_states (
    id UUID PRIMARY KEY,
    debt_kind VARCHAR(10) NOT NULL CHECK (debt_kind IN ('tracking', 'invoice')),
    debt_id UUID NOT NULL,
    party_kind VARCHAR(10) NOT NULL,
    party_id UUID NOT NULL,
    last_applied_level SMALLINT NOT NULL DEFAULT 0 CHECK (last_applied_level BETWEEN 0 AND 3),
    fees_charged_amount NUMERIC(19, 4) NOT NULL DEFAULT 0,
    fees_charged_currency CHAR(3) NOT NULL,
    fees_charged_exchange_rate NUMERIC(19, 8),
    last_evaluated_at BIGINT,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL,
    deleted_at BIGINT
);

CREATE UNIQUE INDEX uq_dunning_states_debt ON dunning_states(debt_kind, debt_id);
";

const STATEMENTS_SQL: &str = r"
CREATE TABLE statements_of_accounts (
    id UUID PRIMARY KEY,
    customer_id UUID NOT NULL REFERENCES customers(id),
    start_date BIGINT NOT NULL,
    end_date BIGINT NOT NULL,
    generated_date BIGINT NOT NULL,
    currency CHAR(3) NOT NULL,
    opening_balance_amount NUMERIC(19, 4) NOT NULL,
    opening_balance_currency CHAR(3) NOT NULL,
    opening_balance_exchange_rate NUMERIC(19, 8),
    total_invoiced_amount NUMERIC(19, 4) NOT NULL,
    total_invoiced_currency CHAR(3) NOT NULL,
    total_invoiced_exchange_rate NUMERIC(19, 8),
    total_paid_amount NUMERIC(19, 4) NOT NULL,
    total_paid_currency CHAR(3) NOT NULL,
    total_paid_exchange_rate NUMERIC(19, 8),
    closing_balance_amount NUMERIC(19, 4) NOT NULL,
    closing_balance_currency CHAR(3) NOT NULL,
    closing_balance_exchange_rate NUMERIC(19, 8),
    transactions JSONB NOT NULL DEFAULT '[]',
    outstanding_invoices JSONB NOT NULL DEFAULT '[]',
    exported_at BIGINT,
    export_format VARCHAR(10) CHECK (export_format IN ('pdf', 'csv', 'excel')),
    sent_at BIGINT,
    sent_to VARCHAR(255),
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL,
    deleted_at BIGINT,
    CHECK (start_date <= end_date),
    CHECK (closing_balance_amount = opening_balance_amount + total_invoiced_amount - total_paid_amount)
);

CREATE INDEX idx_statements_customer ON statements_of_accounts(customer_id, generated_date DESC)
    WHERE deleted_at IS NULL;
CREATE INDEX idx_statements_period ON statements_of_accounts(start_date, end_date)
    WHERE deleted_at IS NULL;
";

const AUDIT_LOG_SQL: &str = r"
CREATE TABLE audit_log (
    id UUID PRIMARY KEY,
    entity_type VARCHAR(30) NOT NULL,
    entity_id UUID NOT NULL,
    event VARCHAR(50) NOT NULL,
    payload JSONB NOT NULL,
    actor_id UUID,
    created_at BIGINT NOT NULL,
    updated_at BIGINT NOT NULL,
    deleted_at BIGINT
);

CREATE INDEX idx_audit_log_entity ON audit_log(entity_type, entity_id, created_at);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS audit_log CASCADE;
DROP TABLE IF EXISTS statements_of_accounts CASCADE;
DROP TABLE IF EXISTS dunning_states CASCADE;
DROP TABLE IF EXISTS dunning_configs CASCADE;
DROP TABLE IF EXISTS incoming_invoice_trackings CASCADE;
DROP TABLE IF EXISTS invoices CASCADE;
DROP TABLE IF EXISTS shipments CASCADE;
DROP TABLE IF EXISTS partners CASCADE;
DROP TABLE IF EXISTS customers CASCADE;
";
