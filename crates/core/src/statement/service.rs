//! Statement of accounts reconstruction.
//!
//! Balances are computed as of the period boundaries: an invoice counts towards
//! the opening balance when it was issued before the period and not settled
//! before the period started, regardless of its status today.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use freightbook_shared::clock::floor_days_between;
use freightbook_shared::types::{Currency, CurrencyAmount, CustomerId, StatementId};

use crate::audit::LedgerEvent;
use crate::statement::error::StatementError;
use crate::statement::types::{
    ExportFormat, InvoiceRecord, OutstandingInvoice, StatementOfAccounts, StatementPeriod,
    StatementSummary, StatementTransaction, TransactionKind,
};

/// Stateless statement builder.
pub struct StatementService;

impl StatementService {
    /// Invoices relevant to a period: billable invoices issued inside it, plus
    /// billable invoices issued before it that were still open at its start.
    pub fn working_set<'a>(
        invoices: &'a [InvoiceRecord],
        period: &StatementPeriod,
    ) -> impl Iterator<Item = &'a InvoiceRecord> {
        let period = *period;
        invoices.iter().filter(move |inv| {
            inv.status.is_billable()
                && inv.issue_date <= period.end
                && (period.contains(inv.issue_date) || inv.open_at_start_of(period.start))
        })
    }

    /// True if the customer has anything to report for the period.
    #[must_use]
    pub fn has_activity(invoices: &[InvoiceRecord], period: &StatementPeriod) -> bool {
        Self::working_set(invoices, period).next().is_some()
    }

    /// Builds a statement snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Money` when an amount in another currency carries no exchange rate.
    pub fn build(
        customer_id: CustomerId,
        period: StatementPeriod,
        currency: Currency,
        invoices: &[InvoiceRecord],
        generated_at: DateTime<Utc>,
    ) -> Result<StatementOfAccounts, StatementError> {
        let mut opening = Decimal::ZERO;
        let mut lines: Vec<StatementTransaction> = Vec::new();
        let mut outstanding: Vec<OutstandingInvoice> = Vec::new();

        for invoice in Self::working_set(invoices, &period) {
            let total = invoice.total_amount.in_currency(currency)?;

            if period.contains(invoice.issue_date) {
                lines.push(StatementTransaction {
                    date: invoice.issue_date,
                    kind: TransactionKind::Invoice,
                    invoice_id: invoice.id,
                    invoice_number: invoice.invoice_number.clone(),
                    description: format!("Invoice {}", invoice.invoice_number),
                    debit: Some(total),
                    credit: None,
                    balance: CurrencyAmount::zero(currency),
                });
            } else {
                opening += total.amount;
            }

            if let Some(settled) = invoice.settled_at()
                && period.contains(settled)
            {
                let credit = invoice
                    .paid_amount
                    .map_or(Ok(total), |paid| paid.in_currency(currency))?;
                lines.push(StatementTransaction {
                    date: settled,
                    kind: TransactionKind::Payment,
                    invoice_id: invoice.id,
                    invoice_number: invoice.invoice_number.clone(),
                    description: format!("Payment for invoice {}", invoice.invoice_number),
                    debit: None,
                    credit: Some(credit),
                    balance: CurrencyAmount::zero(currency),
                });
            }

            if invoice.open_after(period.end) {
                outstanding.push(OutstandingInvoice {
                    invoice_id: invoice.id,
                    invoice_number: invoice.invoice_number.clone(),
                    issue_date: invoice.issue_date,
                    due_date: invoice.due_date,
                    amount: total,
                    days_overdue: floor_days_between(invoice.due_date, period.end).max(0),
                });
            }
        }

        lines.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.kind.cmp(&b.kind))
                .then_with(|| a.invoice_number.cmp(&b.invoice_number))
        });
        outstanding.sort_by(|a, b| {
            a.due_date
                .cmp(&b.due_date)
                .then_with(|| a.invoice_number.cmp(&b.invoice_number))
        });

        let mut balance = opening;
        let mut invoiced = Decimal::ZERO;
        let mut paid = Decimal::ZERO;
        for line in &mut lines {
            if let Some(debit) = line.debit {
                balance += debit.amount;
                invoiced += debit.amount;
            }
            if let Some(credit) = line.credit {
                balance -= credit.amount;
                paid += credit.amount;
            }
            line.balance = CurrencyAmount::new(balance, currency);
        }

        Ok(StatementOfAccounts {
            id: StatementId::new(),
            customer_id,
            start_date: period.start,
            end_date: period.end,
            generated_date: generated_at,
            currency,
            opening_balance: CurrencyAmount::new(opening, currency),
            total_invoiced: CurrencyAmount::new(invoiced, currency),
            total_paid: CurrencyAmount::new(paid, currency),
            closing_balance: CurrencyAmount::new(opening + invoiced - paid, currency),
            transactions: lines,
            outstanding_invoices: outstanding,
            exported_at: None,
            export_format: None,
            sent_at: None,
            sent_to: None,
        })
    }

    /// Counts and totals of a statement.
    #[must_use]
    pub fn summarize(statement: &StatementOfAccounts) -> StatementSummary {
        let invoice_count = statement
            .transactions
            .iter()
            .filter(|t| t.kind == TransactionKind::Invoice)
            .count();
        StatementSummary {
            statement_id: statement.id,
            customer_id: statement.customer_id,
            start_date: statement.start_date,
            end_date: statement.end_date,
            transaction_count: statement.transactions.len(),
            invoice_count,
            payment_count: statement.transactions.len() - invoice_count,
            outstanding_count: statement.outstanding_invoices.len(),
            opening_balance: statement.opening_balance,
            total_invoiced: statement.total_invoiced,
            total_paid: statement.total_paid,
            closing_balance: statement.closing_balance,
        }
    }

    /// Audit event for a freshly generated statement.
    #[must_use]
    pub fn generated_event(statement: &StatementOfAccounts) -> LedgerEvent {
        LedgerEvent::StatementGenerated {
            customer_id: statement.customer_id,
            start_date: statement.start_date,
            end_date: statement.end_date,
            closing_balance: statement.closing_balance,
        }
    }

    /// Records an export.
    pub fn mark_exported(
        statement: &mut StatementOfAccounts,
        format: ExportFormat,
        now: DateTime<Utc>,
    ) -> LedgerEvent {
        statement.exported_at = Some(now);
        statement.export_format = Some(format);
        LedgerEvent::StatementExported { format }
    }

    /// Picks the address a statement is sent to.
    ///
    /// # Errors
    ///
    /// - `MissingRecipient` if neither address is present
    /// - `InvalidRecipient` if the chosen address is not an e-mail address
    pub fn resolve_recipient(
        requested: Option<&str>,
        directory_email: Option<&str>,
    ) -> Result<String, StatementError> {
        let recipient = requested
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .or_else(|| directory_email.map(str::trim).filter(|r| !r.is_empty()))
            .ok_or(StatementError::MissingRecipient)?;

        match recipient.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
                Ok(recipient.to_string())
            }
            _ => Err(StatementError::InvalidRecipient(recipient.to_string())),
        }
    }

    /// Records a send.
    pub fn mark_sent(
        statement: &mut StatementOfAccounts,
        recipient: String,
        now: DateTime<Utc>,
    ) -> LedgerEvent {
        statement.sent_at = Some(now);
        statement.sent_to = Some(recipient.clone());
        LedgerEvent::StatementSent { recipient }
    }
}
