//! Statement domain types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use freightbook_shared::clock::{end_of_day, start_of_day};
use freightbook_shared::types::{Currency, CurrencyAmount, CustomerId, InvoiceId, StatementId};

use crate::statement::error::StatementError;

/// Status of an invoice in the billing module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Not yet issued.
    Draft,
    /// Issued and sent.
    Sent,
    /// Fully paid.
    Paid,
    /// Past due.
    Overdue,
    /// Voided.
    Cancelled,
}

impl InvoiceStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Sent),
            "paid" => Some(Self::Paid),
            "overdue" => Some(Self::Overdue),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true for invoices that count towards a customer's ledger.
    #[must_use]
    pub const fn is_billable(&self) -> bool {
        !matches!(self, Self::Draft | Self::Cancelled)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read-only view of an outgoing invoice, as supplied by the billing module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    /// Invoice ID.
    pub id: InvoiceId,
    /// Human-readable invoice number.
    pub invoice_number: String,
    /// Issue date.
    pub issue_date: DateTime<Utc>,
    /// Due date.
    pub due_date: DateTime<Utc>,
    /// Invoice total.
    pub total_amount: CurrencyAmount,
    /// Amount received, when paid.
    pub paid_amount: Option<CurrencyAmount>,
    /// When the payment was received.
    pub paid_date: Option<DateTime<Utc>>,
    /// Billing status.
    pub status: InvoiceStatus,
}

impl InvoiceRecord {
    /// Instant the invoice was settled, `None` while unpaid.
    ///
    /// A paid invoice without a payment date counts as settled on its issue date.
    #[must_use]
    pub fn settled_at(&self) -> Option<DateTime<Utc>> {
        (self.status == InvoiceStatus::Paid).then(|| self.paid_date.unwrap_or(self.issue_date))
    }

    /// True if the invoice was not settled before `at`.
    #[must_use]
    pub fn open_at_start_of(&self, at: DateTime<Utc>) -> bool {
        self.settled_at().is_none_or(|settled| settled >= at)
    }

    /// True if the invoice was still unsettled at `at`.
    #[must_use]
    pub fn open_after(&self, at: DateTime<Utc>) -> bool {
        self.settled_at().is_none_or(|settled| settled > at)
    }
}

/// Inclusive statement period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementPeriod {
    /// First instant of the period.
    pub start: DateTime<Utc>,
    /// Last instant of the period.
    pub end: DateTime<Utc>,
}

impl StatementPeriod {
    /// Creates a period.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod` if `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, StatementError> {
        if start > end {
            return Err(StatementError::InvalidPeriod { start, end });
        }
        Ok(Self { start, end })
    }

    /// Period covering whole calendar days, from the start of `start` to the end of `end`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriod` if `start > end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self, StatementError> {
        Self::new(start_of_day(start), end_of_day(end))
    }

    /// True if `at` lies inside the period.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Kind of statement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// An invoice was issued (debit).
    Invoice,
    /// A payment was received (credit).
    Payment,
}

/// One statement line with the balance after applying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementTransaction {
    /// When it happened.
    pub date: DateTime<Utc>,
    /// Invoice or payment.
    pub kind: TransactionKind,
    /// Invoice the line belongs to.
    pub invoice_id: InvoiceId,
    /// Invoice number.
    pub invoice_number: String,
    /// Line description.
    pub description: String,
    /// Amount owed by this line.
    pub debit: Option<CurrencyAmount>,
    /// Amount received by this line.
    pub credit: Option<CurrencyAmount>,
    /// Balance after this line.
    pub balance: CurrencyAmount,
}

/// An invoice still unpaid at the end of the period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutstandingInvoice {
    /// Invoice ID.
    pub invoice_id: InvoiceId,
    /// Invoice number.
    pub invoice_number: String,
    /// Issue date.
    pub issue_date: DateTime<Utc>,
    /// Due date.
    pub due_date: DateTime<Utc>,
    /// Amount owed, in the statement currency.
    pub amount: CurrencyAmount,
    /// Whole days past due at the end of the period, never negative.
    pub days_overdue: i64,
}

/// Export format of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PDF document.
    Pdf,
    /// Comma separated values.
    Csv,
    /// Spreadsheet.
    Excel,
}

impl ExportFormat {
    /// Returns the string representation of the format.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Csv => "csv",
            Self::Excel => "excel",
        }
    }

    /// Parses a format from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "csv" => Some(Self::Csv),
            "excel" => Some(Self::Excel),
            _ => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable snapshot of a customer's ledger for one period.
///
/// `closing_balance = opening_balance + total_invoiced - total_paid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementOfAccounts {
    /// Statement ID.
    pub id: StatementId,
    /// Customer the statement belongs to.
    pub customer_id: CustomerId,
    /// Period start.
    pub start_date: DateTime<Utc>,
    /// Period end.
    pub end_date: DateTime<Utc>,
    /// When the snapshot was taken.
    pub generated_date: DateTime<Utc>,
    /// Statement currency.
    pub currency: Currency,
    /// Amount owed at period start.
    pub opening_balance: CurrencyAmount,
    /// Invoices issued in the period.
    pub total_invoiced: CurrencyAmount,
    /// Payments received in the period.
    pub total_paid: CurrencyAmount,
    /// Amount owed at period end.
    pub closing_balance: CurrencyAmount,
    /// Lines, ascending by date.
    pub transactions: Vec<StatementTransaction>,
    /// Unpaid invoices at period end, ascending by due date.
    pub outstanding_invoices: Vec<OutstandingInvoice>,
    /// When the statement was last exported.
    pub exported_at: Option<DateTime<Utc>>,
    /// Format of the last export.
    pub export_format: Option<ExportFormat>,
    /// When the statement was last sent.
    pub sent_at: Option<DateTime<Utc>>,
    /// Address the statement was last sent to.
    pub sent_to: Option<String>,
}

impl StatementOfAccounts {
    /// The statement period.
    #[must_use]
    pub const fn period(&self) -> StatementPeriod {
        StatementPeriod {
            start: self.start_date,
            end: self.end_date,
        }
    }

    /// Sum of the outstanding invoice amounts.
    #[must_use]
    pub fn outstanding_total(&self) -> CurrencyAmount {
        CurrencyAmount::new(
            self.outstanding_invoices.iter().map(|o| o.amount.amount).sum(),
            self.currency,
        )
    }
}

/// Counts and totals returned after generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementSummary {
    /// Statement ID.
    pub statement_id: StatementId,
    /// Customer ID.
    pub customer_id: CustomerId,
    /// Period start.
    pub start_date: DateTime<Utc>,
    /// Period end.
    pub end_date: DateTime<Utc>,
    /// Number of lines.
    pub transaction_count: usize,
    /// Number of invoice lines.
    pub invoice_count: usize,
    /// Number of payment lines.
    pub payment_count: usize,
    /// Number of outstanding invoices.
    pub outstanding_count: usize,
    /// Opening balance.
    pub opening_balance: CurrencyAmount,
    /// Invoiced in the period.
    pub total_invoiced: CurrencyAmount,
    /// Paid in the period.
    pub total_paid: CurrencyAmount,
    /// Closing balance.
    pub closing_balance: CurrencyAmount,
}

/// Parameters to regenerate an invalidated statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerationRequest {
    /// Customer ID.
    pub customer_id: CustomerId,
    /// Period start.
    pub start_date: DateTime<Utc>,
    /// Period end.
    pub end_date: DateTime<Utc>,
}
