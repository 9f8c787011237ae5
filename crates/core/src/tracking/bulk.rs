//! Bulk creation planning for delivered shipments.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use freightbook_shared::LedgerConfig;
use freightbook_shared::types::{CurrencyAmount, PartnerId, ShipmentId};

use crate::tracking::error::TrackingError;
use crate::tracking::types::NewTracking;

/// Largest accepted bulk window, in days.
pub const MAX_DAYS_AFTER_DELIVERY: i64 = 3650;

/// A delivered shipment considered by the bulk scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentCandidate {
    /// Shipment ID.
    pub shipment_id: ShipmentId,
    /// Carrier or subcontractor, if assigned.
    pub partner_id: Option<PartnerId>,
    /// When the shipment was delivered.
    pub delivered_at: DateTime<Utc>,
    /// Cost agreed with the partner.
    pub agreed_cost: Option<CurrencyAmount>,
    /// A tracking row already exists.
    pub has_tracking: bool,
    /// An incoming invoice is already recorded for the shipment.
    pub has_incoming_invoice: bool,
}

/// Why a shipment was not given a tracking row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Delivered after the cutoff.
    NotYetDue,
    /// A tracking row already exists.
    AlreadyTracked,
    /// The partner invoice already arrived.
    InvoiceAlreadyReceived,
    /// No partner assigned to the shipment.
    NoPartner,
}

impl SkipReason {
    /// Returns the string representation of the reason.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotYetDue => "not_yet_due",
            Self::AlreadyTracked => "already_tracked",
            Self::InvoiceAlreadyReceived => "invoice_already_received",
            Self::NoPartner => "no_partner",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkDecision {
    /// Create a tracking row with this input.
    Create(NewTracking),
    /// Leave the shipment alone.
    Skip(SkipReason),
}

/// Bulk creation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkPolicy {
    /// Shipments delivered before `now - days_after_delivery` are eligible.
    pub days_after_delivery: i64,
    /// The invoice is expected this many days after delivery.
    pub expected_offset_days: i64,
}

impl Default for BulkPolicy {
    fn default() -> Self {
        Self {
            days_after_delivery: 7,
            expected_offset_days: 3,
        }
    }
}

impl BulkPolicy {
    /// Policy from the ledger configuration.
    #[must_use]
    pub const fn from_config(config: &LedgerConfig) -> Self {
        Self {
            days_after_delivery: config.bulk_days_after_delivery,
            expected_offset_days: config.expected_invoice_offset_days,
        }
    }

    /// Same policy with a caller-chosen window.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBulkWindow` for a negative window or one longer than
    /// `MAX_DAYS_AFTER_DELIVERY`.
    pub fn with_days_after_delivery(self, days: i64) -> Result<Self, TrackingError> {
        if !(0..=MAX_DAYS_AFTER_DELIVERY).contains(&days) {
            return Err(TrackingError::InvalidBulkWindow {
                days,
                max: MAX_DAYS_AFTER_DELIVERY,
            });
        }
        Ok(Self {
            days_after_delivery: days,
            ..self
        })
    }

    /// Latest delivery instant still eligible at `now`.
    #[must_use]
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days_after_delivery)
    }

    /// Decides what to do with one delivered shipment.
    #[must_use]
    pub fn decide(&self, candidate: &ShipmentCandidate, now: DateTime<Utc>) -> BulkDecision {
        if candidate.delivered_at >= self.cutoff(now) {
            return BulkDecision::Skip(SkipReason::NotYetDue);
        }
        if candidate.has_tracking {
            return BulkDecision::Skip(SkipReason::AlreadyTracked);
        }
        if candidate.has_incoming_invoice {
            return BulkDecision::Skip(SkipReason::InvoiceAlreadyReceived);
        }
        let Some(partner_id) = candidate.partner_id else {
            return BulkDecision::Skip(SkipReason::NoPartner);
        };

        BulkDecision::Create(NewTracking {
            shipment_id: candidate.shipment_id,
            partner_id,
            expected_date: candidate.delivered_at + Duration::days(self.expected_offset_days),
            expected_amount: candidate.agreed_cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use freightbook_shared::types::Currency;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap()
    }

    fn candidate(days_ago: i64) -> ShipmentCandidate {
        ShipmentCandidate {
            shipment_id: ShipmentId::new(),
            partner_id: Some(PartnerId::new()),
            delivered_at: now() - Duration::days(days_ago),
            agreed_cost: Some(CurrencyAmount::new(dec!(450), Currency::Eur)),
            has_tracking: false,
            has_incoming_invoice: false,
        }
    }

    #[test]
    fn test_creates_with_offset_and_agreed_cost() {
        let c = candidate(10);
        let decision = BulkPolicy::default().decide(&c, now());
        let BulkDecision::Create(input) = decision else {
            panic!("expected create, got {decision:?}");
        };
        assert_eq!(input.shipment_id, c.shipment_id);
        assert_eq!(input.partner_id, c.partner_id.unwrap());
        assert_eq!(input.expected_date, c.delivered_at + Duration::days(3));
        assert_eq!(input.expected_amount, c.agreed_cost);
    }

    #[test]
    fn test_custom_window_moves_cutoff() {
        let policy = BulkPolicy::default().with_days_after_delivery(1).unwrap();
        assert_eq!(policy.expected_offset_days, 3);
        assert!(matches!(
            policy.decide(&candidate(2), now()),
            BulkDecision::Create(_)
        ));
    }

    #[rstest::rstest]
    #[case(-1)]
    #[case(MAX_DAYS_AFTER_DELIVERY + 1)]
    #[case(i64::MAX)]
    fn test_window_out_of_range(#[case] days: i64) {
        assert_eq!(
            BulkPolicy::default().with_days_after_delivery(days),
            Err(TrackingError::InvalidBulkWindow {
                days,
                max: MAX_DAYS_AFTER_DELIVERY,
            })
        );
    }

    #[test]
    fn test_skip_reasons() {
        let policy = BulkPolicy::default();

        let recent = candidate(2);
        assert_eq!(
            policy.decide(&recent, now()),
            BulkDecision::Skip(SkipReason::NotYetDue)
        );

        let tracked = ShipmentCandidate {
            has_tracking: true,
            ..candidate(10)
        };
        assert_eq!(
            policy.decide(&tracked, now()),
            BulkDecision::Skip(SkipReason::AlreadyTracked)
        );

        let invoiced = ShipmentCandidate {
            has_incoming_invoice: true,
            ..candidate(10)
        };
        assert_eq!(
            policy.decide(&invoiced, now()),
            BulkDecision::Skip(SkipReason::InvoiceAlreadyReceived)
        );

        let orphan = ShipmentCandidate {
            partner_id: None,
            ..candidate(10)
        };
        assert_eq!(
            policy.decide(&orphan, now()),
            BulkDecision::Skip(SkipReason::NoPartner)
        );
    }

    #[test]
    fn test_cutoff_is_exclusive() {
        let policy = BulkPolicy::default();
        let exactly = candidate(7);
        assert_eq!(
            policy.decide(&exactly, now()),
            BulkDecision::Skip(SkipReason::NotYetDue)
        );
        let older = ShipmentCandidate {
            delivered_at: policy.cutoff(now()) - Duration::seconds(1),
            ..candidate(7)
        };
        assert!(matches!(policy.decide(&older, now()), BulkDecision::Create(_)));
    }

    #[test]
    fn test_from_config_matches_default() {
        assert_eq!(
            BulkPolicy::from_config(&LedgerConfig::default()),
            BulkPolicy::default()
        );
        let config = LedgerConfig {
            bulk_days_after_delivery: 14,
            ..LedgerConfig::default()
        };
        assert_eq!(BulkPolicy::from_config(&config).days_after_delivery, 14);
    }
}
