//! Card (§3): a capability over its owning account, not an independent
//! ledger.

use crate::identity::{AccountId, CardId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardType {
    Debit,
    Credit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardStatus {
    Active,
    Blocked,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub account: AccountId,
    /// Full 16-digit PAN. Never serialized to API responses — handlers
    /// expose `masked()` instead.
    pub number: String,
    pub card_type: CardType,
    pub holder_name: String,
    pub expiry: DateTime<Utc>,
    pub daily_limit: Option<Money>,
    pub monthly_limit: Option<Money>,
    pub status: CardStatus,
}

impl Card {
    pub fn masked(&self) -> String {
        let digits: Vec<char> = self.number.chars().collect();
        if digits.len() < 4 {
            return "*".repeat(digits.len());
        }
        let last4: String = digits[digits.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(digits.len() - 4), last4)
    }
}

/// Luhn checksum validation for 16-digit card numbers (§3 "16-digit
/// number (Luhn-valid)").
pub fn luhn_is_valid(number: &str) -> bool {
    let digits: Vec<u32> = number.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != number.len() || digits.len() != 16 {
        return false;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luhn_rejects_non_16_digit_input() {
        assert!(!luhn_is_valid("1234"));
    }

    #[test]
    fn luhn_accepts_known_valid_number() {
        assert!(luhn_is_valid("4532015112830366"));
    }

    #[test]
    fn luhn_rejects_tampered_number() {
        assert!(!luhn_is_valid("4532015112830367"));
    }

    #[test]
    fn masked_keeps_last_four_digits() {
        let card = Card {
            id: CardId::new(),
            account: AccountId::new(),
            number: "4532015112830366".to_string(),
            card_type: CardType::Debit,
            holder_name: "A B".into(),
            expiry: Utc::now(),
            daily_limit: None,
            monthly_limit: None,
            status: CardStatus::Active,
        };
        assert_eq!(card.masked(), "************0366");
    }
}
