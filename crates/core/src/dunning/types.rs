//! Dunning domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use freightbook_shared::DunningDefaults;
use freightbook_shared::types::{
    Currency, CurrencyAmount, CustomerId, DunningConfigId, InvoiceId, PartnerId, TrackingId,
};

/// Escalation level of an overdue debt.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u8")]
pub enum DunningLevel {
    /// Not overdue enough for any level.
    #[default]
    None,
    /// First reminder.
    First,
    /// Second reminder.
    Second,
    /// Final notice.
    Third,
}

impl DunningLevel {
    /// Levels that carry a policy, lowest first.
    pub const ESCALATING: [Self; 3] = [Self::First, Self::Second, Self::Third];

    /// Returns the numeric level (0-3).
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
        }
    }

    /// Parses a numeric level.
    #[must_use]
    pub const fn from_u8(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::None),
            1 => Some(Self::First),
            2 => Some(Self::Second),
            3 => Some(Self::Third),
            _ => None,
        }
    }
}

impl From<DunningLevel> for u8 {
    fn from(level: DunningLevel) -> Self {
        level.as_u8()
    }
}

impl TryFrom<u8> for DunningLevel {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::from_u8(level).ok_or_else(|| format!("unknown dunning level {level}"))
    }
}

impl fmt::Display for DunningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Display severity of an overdue item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Up to 7 days.
    Low,
    /// 8 to 14 days.
    Medium,
    /// 15 to 30 days.
    High,
    /// More than 30 days.
    Critical,
}

impl Severity {
    /// Classifies a number of days overdue.
    #[must_use]
    pub const fn for_days_overdue(days: i64) -> Self {
        if days > 30 {
            Self::Critical
        } else if days > 14 {
            Self::High
        } else if days > 7 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Returns the string representation of the severity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Owner of a dunning configuration: a customer or a partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Party {
    /// A customer (owner of outgoing invoices).
    Customer(CustomerId),
    /// A partner (owner of incoming invoice trackings).
    Partner(PartnerId),
}

impl Party {
    /// Returns the kind stored in the database.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Customer(_) => "customer",
            Self::Partner(_) => "partner",
        }
    }

    /// Returns the party's UUID.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Customer(id) => id.0,
            Self::Partner(id) => id.0,
        }
    }

    /// Rebuilds a party from its stored parts.
    #[must_use]
    pub fn from_parts(kind: &str, id: Uuid) -> Option<Self> {
        match kind {
            "customer" => Some(Self::Customer(CustomerId(id))),
            "partner" => Some(Self::Partner(PartnerId(id))),
            _ => None,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// A debt the dunning engine can evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DebtRef {
    /// An expected incoming invoice the partner has not sent.
    Tracking(TrackingId),
    /// An outgoing invoice the customer has not paid.
    Invoice(InvoiceId),
}

impl DebtRef {
    /// Returns the kind stored in the database.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Tracking(_) => "tracking",
            Self::Invoice(_) => "invoice",
        }
    }

    /// Returns the debt's UUID.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        match self {
            Self::Tracking(id) => id.0,
            Self::Invoice(id) => id.0,
        }
    }

    /// Rebuilds a debt reference from its stored parts.
    #[must_use]
    pub fn from_parts(kind: &str, id: Uuid) -> Option<Self> {
        match kind {
            "tracking" => Some(Self::Tracking(TrackingId(id))),
            "invoice" => Some(Self::Invoice(InvoiceId(id))),
            _ => None,
        }
    }
}

impl fmt::Display for DebtRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// Threshold, fee and auto-send flag of one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelPolicy {
    /// Days overdue at which the level is reached.
    pub days_overdue: i64,
    /// Fee charged when the level is reached.
    pub fee: Decimal,
    /// Send a reminder automatically when the level is reached.
    pub auto_send: bool,
}

/// Escalation policy of a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DunningPolicy {
    /// Level 1 policy.
    pub level1: LevelPolicy,
    /// Level 2 policy.
    pub level2: LevelPolicy,
    /// Level 3 policy.
    pub level3: LevelPolicy,
    /// Currency fees are charged in.
    pub fee_currency: Currency,
    /// Suspend service when level 3 is reached.
    pub level3_suspend_service: bool,
    /// Lift a suspension when the debt is paid.
    pub auto_reactivate_on_payment: bool,
}

impl DunningPolicy {
    /// Builds the global default policy from configuration.
    #[must_use]
    pub fn from_defaults(defaults: &DunningDefaults) -> Self {
        Self {
            level1: LevelPolicy {
                days_overdue: defaults.level1_days_overdue,
                fee: defaults.level1_fee,
                auto_send: true,
            },
            level2: LevelPolicy {
                days_overdue: defaults.level2_days_overdue,
                fee: defaults.level2_fee,
                auto_send: true,
            },
            level3: LevelPolicy {
                days_overdue: defaults.level3_days_overdue,
                fee: defaults.level3_fee,
                auto_send: true,
            },
            fee_currency: defaults.fee_currency,
            level3_suspend_service: true,
            auto_reactivate_on_payment: true,
        }
    }

    /// Returns the policy of an escalating level.
    #[must_use]
    pub const fn level(&self, level: DunningLevel) -> Option<&LevelPolicy> {
        match level {
            DunningLevel::None => None,
            DunningLevel::First => Some(&self.level1),
            DunningLevel::Second => Some(&self.level2),
            DunningLevel::Third => Some(&self.level3),
        }
    }

    /// Level reached after `days_overdue` days.
    #[must_use]
    pub const fn level_for(&self, days_overdue: i64) -> DunningLevel {
        if days_overdue >= self.level3.days_overdue {
            DunningLevel::Third
        } else if days_overdue >= self.level2.days_overdue {
            DunningLevel::Second
        } else if days_overdue >= self.level1.days_overdue {
            DunningLevel::First
        } else {
            DunningLevel::None
        }
    }

    /// Fee of a level in the fee currency, `None` for level 0 or a zero fee.
    #[must_use]
    pub fn fee_for(&self, level: DunningLevel) -> Option<CurrencyAmount> {
        self.level(level)
            .filter(|p| p.fee > Decimal::ZERO)
            .map(|p| CurrencyAmount::new(p.fee, self.fee_currency).rounded())
    }

    /// Whether reaching `level` sends a reminder automatically.
    #[must_use]
    pub fn auto_send(&self, level: DunningLevel) -> bool {
        self.level(level).is_some_and(|p| p.auto_send)
    }
}

impl Default for DunningPolicy {
    fn default() -> Self {
        Self::from_defaults(&DunningDefaults::default())
    }
}

/// A party's dunning configuration and current suspension state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DunningConfig {
    /// Row ID, `None` while the party runs on defaults.
    pub id: Option<DunningConfigId>,
    /// Owning party.
    pub party: Party,
    /// Escalation policy.
    pub policy: DunningPolicy,
    /// Service to the party is suspended.
    pub service_suspended: bool,
    /// When the service was suspended.
    pub service_suspended_date: Option<DateTime<Utc>>,
}

impl DunningConfig {
    /// Configuration for a party without an override.
    #[must_use]
    pub const fn defaults_for(party: Party, policy: DunningPolicy) -> Self {
        Self {
            id: None,
            party,
            policy,
            service_suspended: false,
            service_suspended_date: None,
        }
    }
}

/// What the engine remembers about one debt between evaluations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DunningState {
    /// The debt.
    pub debt: DebtRef,
    /// Party the debt belongs to.
    pub party: Party,
    /// Highest level whose fee was charged.
    pub last_applied_level: DunningLevel,
    /// Total fees charged so far.
    pub fees_charged: CurrencyAmount,
    /// When the debt was last evaluated.
    pub last_evaluated_at: Option<DateTime<Utc>>,
}

impl DunningState {
    /// State of a debt that was never evaluated.
    #[must_use]
    pub const fn new(debt: DebtRef, party: Party, fee_currency: Currency) -> Self {
        Self {
            debt,
            party,
            last_applied_level: DunningLevel::None,
            fees_charged: CurrencyAmount::zero(fee_currency),
            last_evaluated_at: None,
        }
    }
}

/// The debt facts the engine needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebtSnapshot {
    /// The debt.
    pub debt: DebtRef,
    /// Party the debt belongs to.
    pub party: Party,
    /// Expected date (tracking) or due date (invoice).
    pub reference_date: DateTime<Utc>,
    /// Paid or cancelled.
    pub settled: bool,
}

/// Result of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DunningDecision {
    /// The debt.
    pub debt: DebtRef,
    /// Party the debt belongs to.
    pub party: Party,
    /// Whole days past the reference date.
    pub days_overdue: i64,
    /// Level determined now.
    pub level: DunningLevel,
    /// Highest level applied before this evaluation.
    pub previous_level: DunningLevel,
    /// Fee charged by this evaluation.
    pub fee_charged: Option<CurrencyAmount>,
    /// A reminder is due because the level advanced with auto-send on.
    pub send_reminder: bool,
    /// Service to the party must be suspended.
    pub suspend_service: bool,
    /// Display severity.
    pub severity: Severity,
}

impl DunningDecision {
    /// True when this evaluation reached a level above the last applied one.
    #[must_use]
    pub fn level_advanced(&self) -> bool {
        self.level > self.previous_level
    }
}
