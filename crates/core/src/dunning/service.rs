//! Dunning escalation engine.
//!
//! Evaluation is pure: the engine reads the debt, the party's configuration and
//! the debt's dunning state, and returns a decision. Applying the decision
//! updates state and configuration in place so the caller can persist both in
//! the same transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use freightbook_shared::clock::floor_days_between;

use crate::audit::LedgerEvent;
use crate::dunning::error::DunningError;
use crate::dunning::types::{
    DebtSnapshot, DunningConfig, DunningDecision, DunningLevel, DunningPolicy, DunningState,
    Severity,
};

/// Audit events produced by applying a decision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppliedDunning {
    /// Escalation of the debt, if the level advanced.
    pub escalated: Option<LedgerEvent>,
    /// Suspension of the party, if it happened now.
    pub suspended: Option<LedgerEvent>,
}

/// Stateless dunning engine.
pub struct DunningEngine;

impl DunningEngine {
    /// Validates a policy before it is stored.
    ///
    /// # Errors
    ///
    /// - `InvalidThresholds` unless `0 < level1 < level2 < level3`
    /// - `NegativeFee` if any fee is below zero
    pub fn validate_policy(policy: &DunningPolicy) -> Result<(), DunningError> {
        let (l1, l2, l3) = (
            policy.level1.days_overdue,
            policy.level2.days_overdue,
            policy.level3.days_overdue,
        );
        if l1 <= 0 || l1 >= l2 || l2 >= l3 {
            return Err(DunningError::InvalidThresholds {
                level1: l1,
                level2: l2,
                level3: l3,
            });
        }
        for level in DunningLevel::ESCALATING {
            if let Some(p) = policy.level(level)
                && p.fee < Decimal::ZERO
            {
                return Err(DunningError::NegativeFee { level, fee: p.fee });
            }
        }
        Ok(())
    }

    /// Evaluates one debt.
    ///
    /// Only a level above `state.last_applied_level` charges a fee, and only the
    /// fee of that new level. Settled debts evaluate to level 0.
    #[must_use]
    pub fn evaluate(
        debt: &DebtSnapshot,
        config: &DunningConfig,
        state: &DunningState,
        now: DateTime<Utc>,
    ) -> DunningDecision {
        let days_overdue = floor_days_between(debt.reference_date, now);
        let level = if debt.settled {
            DunningLevel::None
        } else {
            config.policy.level_for(days_overdue)
        };
        let previous_level = state.last_applied_level;
        let advanced = level > previous_level;

        let fee_charged = if advanced {
            config.policy.fee_for(level)
        } else {
            None
        };
        let send_reminder = advanced && config.policy.auto_send(level);
        let suspend_service = advanced
            && level == DunningLevel::Third
            && config.policy.level3_suspend_service
            && !config.service_suspended;

        DunningDecision {
            debt: debt.debt,
            party: debt.party,
            days_overdue,
            level,
            previous_level,
            fee_charged,
            send_reminder,
            suspend_service,
            severity: Severity::for_days_overdue(days_overdue.max(0)),
        }
    }

    /// Applies a decision to the debt's state and the party's configuration.
    ///
    /// # Errors
    ///
    /// Returns `Money` if the fee currency differs from the accumulated fees.
    pub fn apply(
        decision: &DunningDecision,
        config: &mut DunningConfig,
        state: &mut DunningState,
        now: DateTime<Utc>,
    ) -> Result<AppliedDunning, DunningError> {
        let mut applied = AppliedDunning::default();

        if decision.level_advanced() {
            if let Some(fee) = decision.fee_charged {
                let fees = if state.fees_charged.is_zero() {
                    fee
                } else {
                    state.fees_charged.checked_add(fee)?
                };
                state.fees_charged = fees;
            }
            state.last_applied_level = decision.level;
            applied.escalated = Some(LedgerEvent::DunningEscalated {
                previous_level: decision.previous_level,
                level: decision.level,
                days_overdue: decision.days_overdue,
                fee: decision.fee_charged,
            });
        }
        state.last_evaluated_at = Some(now);

        if decision.suspend_service && !config.service_suspended {
            config.service_suspended = true;
            config.service_suspended_date = Some(now);
            applied.suspended = Some(LedgerEvent::ServiceSuspended {
                party: config.party,
            });
        }

        Ok(applied)
    }

    /// Lifts a suspension after one of the party's debts was paid.
    ///
    /// Returns the reactivation event, or `None` when nothing changed.
    pub fn on_debt_paid(config: &mut DunningConfig) -> Option<LedgerEvent> {
        if !(config.policy.auto_reactivate_on_payment && config.service_suspended) {
            return None;
        }
        config.service_suspended = false;
        config.service_suspended_date = None;
        Some(LedgerEvent::ServiceReactivated {
            party: config.party,
        })
    }
}
