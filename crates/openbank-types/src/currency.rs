//! Currency codes for OpenBank.
//!
//! The sandbox only ever moves fiat money at two-decimal fixed-point
//! precision (§3), so unlike the crypto/synthetic currency union this is
//! grounded on, this is a single flat ISO 4217 enum.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    USD,
    EUR,
    GBP,
    RUB,
    CNY,
    CHF,
    JPY,
}

impl Currency {
    /// Standard decimal places for this currency. JPY has none; every
    /// other currency in the sandbox's scenario set uses two.
    pub fn decimals(&self) -> u8 {
        match self {
            Self::JPY => 0,
            _ => 2,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::RUB => "RUB",
            Self::CNY => "CNY",
            Self::CHF => "CHF",
            Self::JPY => "JPY",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code.to_ascii_uppercase().as_str() {
            "USD" => Some(Self::USD),
            "EUR" => Some(Self::EUR),
            "GBP" => Some(Self::GBP),
            "RUB" => Some(Self::RUB),
            "CNY" => Some(Self::CNY),
            "CHF" => Some(Self::CHF),
            "JPY" => Some(Self::JPY),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rub_round_trips_and_uses_two_decimals() {
        let c = Currency::parse("rub").unwrap();
        assert_eq!(c, Currency::RUB);
        assert_eq!(c.decimals(), 2);
        assert_eq!(c.code(), "RUB");
    }

    #[test]
    fn jpy_has_no_decimals() {
        assert_eq!(Currency::JPY.decimals(), 0);
    }
}
