//! Currency amount type with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` for arbitrary precision.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of decimal places in the minor unit of every supported currency.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// ISO 4217 currency codes supported by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Euro
    Eur,
    /// US Dollar
    Usd,
}

impl Currency {
    /// Returns the ISO code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eur => "EUR",
            Self::Usd => "USD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EUR" => Ok(Self::Eur),
            "USD" => Ok(Self::Usd),
            _ => Err(MoneyError::UnknownCurrency(s.to_string())),
        }
    }
}

/// Errors raised by currency amount arithmetic and conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// Currency code is not supported.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// Two amounts in different currencies were combined.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch {
        /// Currency of the left-hand amount.
        expected: Currency,
        /// Currency of the right-hand amount.
        got: Currency,
    },

    /// A conversion was requested into the amount's own currency.
    #[error("Cannot convert {0} into itself")]
    SameCurrencyPair(Currency),

    /// Exchange rates must be strictly positive.
    #[error("Exchange rate must be positive, got {0}")]
    NonPositiveRate(Decimal),
}

/// A monetary amount with its currency and, for converted amounts, the applied rate.
///
/// Immutable value object: every operation returns a new amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyAmount {
    /// The amount in major units (e.g. `12.50`).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: Currency,
    /// Rate applied when this amount was converted from another currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<Decimal>,
}

impl CurrencyAmount {
    /// Creates a new amount without an exchange rate.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount,
            currency,
            exchange_rate: None,
        }
    }

    /// Creates a zero amount in the specified currency.
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }

    /// Attaches a pre-computed exchange rate supplied by an external collaborator.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::NonPositiveRate`] for zero or negative rates.
    pub fn with_exchange_rate(self, rate: Decimal) -> Result<Self, MoneyError> {
        if rate <= Decimal::ZERO {
            return Err(MoneyError::NonPositiveRate(rate));
        }
        Ok(Self {
            exchange_rate: Some(rate),
            ..self
        })
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Rounds to the currency's minor unit (half away from zero).
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            amount: self
                .amount
                .round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero),
            ..self
        }
    }

    /// Adds two amounts of the same currency.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] when currencies differ.
    pub fn checked_add(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount + other.amount, self.currency))
    }

    /// Subtracts `other` from `self`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] when currencies differ.
    pub fn checked_sub(self, other: Self) -> Result<Self, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount - other.amount, self.currency))
    }

    /// Converts into `target` using a rate quoted as `1 self.currency = rate target`.
    ///
    /// The result is rounded to the minor unit and remembers the applied rate.
    ///
    /// # Errors
    ///
    /// - [`MoneyError::SameCurrencyPair`] if `target` equals the current currency
    /// - [`MoneyError::NonPositiveRate`] if `rate <= 0`
    pub fn convert(self, target: Currency, rate: Decimal) -> Result<Self, MoneyError> {
        if target == self.currency {
            return Err(MoneyError::SameCurrencyPair(target));
        }
        if rate <= Decimal::ZERO {
            return Err(MoneyError::NonPositiveRate(rate));
        }
        Ok(Self {
            amount: self.amount * rate,
            currency: target,
            exchange_rate: Some(rate),
        }
        .rounded())
    }

    /// Expresses this amount in `target`, using the attached exchange rate when the
    /// currencies differ.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::CurrencyMismatch`] when the currencies differ and no
    /// exchange rate is attached.
    pub fn in_currency(self, target: Currency) -> Result<Self, MoneyError> {
        if self.currency == target {
            return Ok(self);
        }
        match self.exchange_rate {
            Some(rate) => self.convert(target, rate),
            None => Err(MoneyError::CurrencyMismatch {
                expected: target,
                got: self.currency,
            }),
        }
    }

    fn ensure_same_currency(self, other: Self) -> Result<(), MoneyError> {
        if self.currency == other.currency {
            Ok(())
        } else {
            Err(MoneyError::CurrencyMismatch {
                expected: self.currency,
                got: other.currency,
            })
        }
    }
}

impl fmt::Display for CurrencyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} {}", self.amount, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn test_amount_new() {
        let amount = CurrencyAmount::new(dec!(100.00), Currency::Eur);
        assert_eq!(amount.amount, dec!(100.00));
        assert_eq!(amount.currency, Currency::Eur);
        assert_eq!(amount.exchange_rate, None);
    }

    #[test]
    fn test_amount_zero() {
        let amount = CurrencyAmount::zero(Currency::Usd);
        assert!(amount.is_zero());
        assert!(!amount.is_negative());
    }

    #[test]
    fn test_amount_is_negative() {
        assert!(CurrencyAmount::new(dec!(-0.01), Currency::Eur).is_negative());
        assert!(!CurrencyAmount::new(dec!(0.01), Currency::Eur).is_negative());
    }

    #[test]
    fn test_checked_add_same_currency() {
        let a = CurrencyAmount::new(dec!(10.25), Currency::Eur);
        let b = CurrencyAmount::new(dec!(4.75), Currency::Eur);
        assert_eq!(a.checked_add(b).unwrap().amount, dec!(15.00));
        assert_eq!(a.checked_sub(b).unwrap().amount, dec!(5.50));
    }

    #[test]
    fn test_checked_add_currency_mismatch() {
        let a = CurrencyAmount::new(dec!(10), Currency::Eur);
        let b = CurrencyAmount::new(dec!(10), Currency::Usd);
        assert_eq!(
            a.checked_add(b),
            Err(MoneyError::CurrencyMismatch {
                expected: Currency::Eur,
                got: Currency::Usd,
            })
        );
    }

    #[test]
    fn test_convert_applies_rate_and_rounds() {
        let usd = CurrencyAmount::new(dec!(100), Currency::Usd);
        let eur = usd.convert(Currency::Eur, dec!(0.91237)).unwrap();
        assert_eq!(eur.currency, Currency::Eur);
        assert_eq!(eur.amount, dec!(91.24));
        assert_eq!(eur.exchange_rate, Some(dec!(0.91237)));
    }

    #[test]
    fn test_convert_rejects_same_pair() {
        let eur = CurrencyAmount::new(dec!(1), Currency::Eur);
        assert_eq!(
            eur.convert(Currency::Eur, dec!(1)),
            Err(MoneyError::SameCurrencyPair(Currency::Eur))
        );
    }

    #[test]
    fn test_convert_rejects_non_positive_rate() {
        let eur = CurrencyAmount::new(dec!(1), Currency::Eur);
        assert!(matches!(
            eur.convert(Currency::Usd, dec!(0)),
            Err(MoneyError::NonPositiveRate(_))
        ));
        assert!(eur.with_exchange_rate(dec!(-1.1)).is_err());
    }

    #[test]
    fn test_in_currency_requires_rate() {
        let usd = CurrencyAmount::new(dec!(50), Currency::Usd);
        assert!(usd.in_currency(Currency::Eur).is_err());

        let usd = usd.with_exchange_rate(dec!(0.5)).unwrap();
        assert_eq!(usd.in_currency(Currency::Eur).unwrap().amount, dec!(25.00));
        assert_eq!(usd.in_currency(Currency::Usd).unwrap(), usd);
    }

    #[test]
    fn test_rounded_half_away_from_zero() {
        let a = CurrencyAmount::new(dec!(2.345), Currency::Eur).rounded();
        assert_eq!(a.amount, dec!(2.35));
    }

    #[test]
    fn test_currency_display_and_parse() {
        assert_eq!(Currency::Eur.to_string(), "EUR");
        assert_eq!(Currency::Usd.to_string(), "USD");
        assert_eq!(Currency::from_str("eur").unwrap(), Currency::Eur);
        assert!(Currency::from_str("IDR").is_err());
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(CurrencyAmount::new(dec!(12.5), Currency::Usd)).unwrap();
        assert_eq!(json["currency"], "USD");
        assert!(json.get("exchangeRate").is_none());
    }
}
