//! Fixed-point money type.
//!
//! Grounded on `Amount` (i128, 18-decimal precision, checked arithmetic)
//! but narrowed to what §3 actually asks for: a fixed-point value at
//! exactly two decimal places, stored as integer minor units (cents) to
//! keep every ledger operation exact and overflow-checked.

use crate::error::{BankError, BankResult};
use crate::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// A monetary amount, fixed at two decimal places, in a specific currency.
/// Internally stored as minor units (cents) to avoid float drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    /// Value in minor units (cents). May be negative for ledger deltas.
    cents: i64,
    currency: Currency,
}

impl Money {
    pub fn new(cents: i64, currency: Currency) -> Self {
        Self { cents, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self { cents: 0, currency }
    }

    /// Build from a major-unit decimal value, e.g. `Money::from_major(250.00, RUB)`.
    pub fn from_major(major: Decimal, currency: Currency) -> BankResult<Self> {
        let scaled = major * Decimal::from(MINOR_UNITS_PER_MAJOR);
        let cents = scaled
            .round()
            .to_string()
            .parse::<i64>()
            .map_err(|_| BankError::validation("amount out of range"))?;
        Ok(Self { cents, currency })
    }

    pub fn cents(&self) -> i64 {
        self.cents
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.cents == 0
    }

    pub fn is_positive(&self) -> bool {
        self.cents > 0
    }

    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    pub fn abs(&self) -> Self {
        Self {
            cents: self.cents.abs(),
            currency: self.currency,
        }
    }

    pub fn negate(&self) -> Self {
        Self {
            cents: -self.cents,
            currency: self.currency,
        }
    }

    /// Convert to a `rust_decimal::Decimal` major-unit value, for the
    /// storage layer's `NUMERIC` columns.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.cents, 2)
    }

    pub fn from_decimal(value: Decimal, currency: Currency) -> BankResult<Self> {
        let scaled = value * Decimal::from(MINOR_UNITS_PER_MAJOR);
        let cents = scaled
            .round()
            .to_string()
            .parse::<i64>()
            .map_err(|_| BankError::validation("amount out of range"))?;
        Ok(Self { cents, currency })
    }

    fn check_same_currency(&self, other: &Money) -> BankResult<()> {
        if self.currency != other.currency {
            return Err(BankError::validation(format!(
                "currency mismatch: {} vs {}",
                self.currency, other.currency
            )));
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &Money) -> BankResult<Self> {
        self.check_same_currency(other)?;
        let cents = self
            .cents
            .checked_add(other.cents)
            .ok_or_else(|| BankError::validation("amount overflow"))?;
        Ok(Self {
            cents,
            currency: self.currency,
        })
    }

    pub fn checked_sub(&self, other: &Money) -> BankResult<Self> {
        self.check_same_currency(other)?;
        let cents = self
            .cents
            .checked_sub(other.cents)
            .ok_or_else(|| BankError::validation("amount underflow"))?;
        Ok(Self {
            cents,
            currency: self.currency,
        })
    }

    pub fn checked_mul_u32(&self, factor: u32) -> BankResult<Self> {
        let cents = self
            .cents
            .checked_mul(factor as i64)
            .ok_or_else(|| BankError::validation("amount overflow"))?;
        Ok(Self {
            cents,
            currency: self.currency,
        })
    }
}

impl PartialOrd for Money {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.currency != other.currency {
            return None;
        }
        Some(self.cents.cmp(&other.cents))
    }
}

impl FromStr for Money {
    type Err = BankError;

    /// Parse `"250.00"` paired separately with a currency — callers combine
    /// this with a currency code parsed from the request. Bare `Money`
    /// strings are not currency-qualified, so this always yields a USD
    /// placeholder; handlers that accept amount+currency fields construct
    /// `Money` via `from_major`/`from_decimal` instead and never call this.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s).map_err(|_| BankError::validation("invalid amount"))?;
        Self::from_major(decimal, Currency::USD)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_decimal(), self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn from_major_round_trips_through_decimal() {
        let m = Money::from_major(dec!(250.00), Currency::RUB).unwrap();
        assert_eq!(m.cents(), 25000);
        assert_eq!(m.to_decimal(), dec!(250.00));
    }

    #[test]
    fn checked_sub_rejects_currency_mismatch() {
        let a = Money::from_major(dec!(10.00), Currency::RUB).unwrap();
        let b = Money::from_major(dec!(5.00), Currency::USD).unwrap();
        assert!(a.checked_sub(&b).is_err());
    }

    #[test]
    fn checked_sub_detects_underflow() {
        let a = Money::new(i64::MIN + 1, Currency::USD);
        let b = Money::new(10, Currency::USD);
        assert!(a.checked_sub(&b).is_err());
    }
}
