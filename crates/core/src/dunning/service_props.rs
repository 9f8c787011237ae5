//! Property-based tests for the dunning engine.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use freightbook_shared::types::{Currency, CurrencyAmount, InvoiceId, PartnerId, TrackingId};

use crate::dunning::service::DunningEngine;
use crate::dunning::types::{
    DebtRef, DebtSnapshot, DunningConfig, DunningLevel, DunningPolicy, DunningState, Party,
};

fn reference() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap()
}

fn arb_policy() -> impl Strategy<Value = DunningPolicy> {
    (1i64..30, 1i64..30, 1i64..30, 0u32..100, 0u32..100, 0u32..100).prop_map(
        |(a, b, c, f1, f2, f3)| {
            let mut policy = DunningPolicy::default();
            policy.level1.days_overdue = a;
            policy.level2.days_overdue = a + b;
            policy.level3.days_overdue = a + b + c;
            policy.level1.fee = f1.into();
            policy.level2.fee = f2.into();
            policy.level3.fee = f3.into();
            policy
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The level never decreases as days overdue grow.
    #[test]
    fn prop_level_monotonic(policy in arb_policy(), a in -100i64..400, b in -100i64..400) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(policy.level_for(lo) <= policy.level_for(hi));
    }

    /// Generated policies pass validation.
    #[test]
    fn prop_generated_policy_valid(policy in arb_policy()) {
        prop_assert!(DunningEngine::validate_policy(&policy).is_ok());
    }

    /// Daily evaluation charges each reached level's fee exactly once.
    #[test]
    fn prop_fees_equal_sum_of_reached_levels(policy in arb_policy(), days in 0i64..120) {
        let party = Party::Partner(PartnerId::new());
        let debt = DebtSnapshot {
            debt: DebtRef::Tracking(TrackingId::new()),
            party,
            reference_date: reference(),
            settled: false,
        };
        let mut config = DunningConfig::defaults_for(party, policy);
        let mut state = DunningState::new(debt.debt, party, Currency::Eur);

        for day in 0..=days {
            let now = reference() + Duration::days(day);
            let decision = DunningEngine::evaluate(&debt, &config, &state, now);
            prop_assert!(decision.level >= state.last_applied_level || decision.level == DunningLevel::None);
            DunningEngine::apply(&decision, &mut config, &mut state, now).unwrap();
        }

        let reached = policy.level_for(days);
        let expected: rust_decimal::Decimal = DunningLevel::ESCALATING
            .iter()
            .filter(|level| **level <= reached)
            .filter_map(|level| policy.fee_for(*level))
            .map(|fee| fee.amount)
            .sum();
        prop_assert_eq!(state.fees_charged, CurrencyAmount::new(expected, Currency::Eur));
        prop_assert_eq!(state.last_applied_level, reached);
    }

    /// Re-evaluating at the same instant never charges again.
    #[test]
    fn prop_repeat_evaluation_is_free(policy in arb_policy(), days in 0i64..120) {
        let party = Party::Customer(freightbook_shared::types::CustomerId::new());
        let debt = DebtSnapshot {
            debt: DebtRef::Invoice(InvoiceId::new()),
            party,
            reference_date: reference(),
            settled: false,
        };
        let mut config = DunningConfig::defaults_for(party, policy);
        let mut state = DunningState::new(debt.debt, party, Currency::Eur);
        let now = reference() + Duration::days(days);

        let first = DunningEngine::evaluate(&debt, &config, &state, now);
        DunningEngine::apply(&first, &mut config, &mut state, now).unwrap();
        let second = DunningEngine::evaluate(&debt, &config, &state, now);
        prop_assert_eq!(second.fee_charged, None);
        prop_assert!(!second.send_reminder);
        prop_assert!(!second.suspend_service);
    }
}
